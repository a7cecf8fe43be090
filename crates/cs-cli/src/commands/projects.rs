//! Projects command: lists the workspace's projects.

use std::io::Write;

use anyhow::Result;

use cs_core::TimeTrackingSink;

pub async fn run<W: Write, T: TimeTrackingSink + Send>(writer: &mut W, sink: &mut T) -> Result<()> {
    let mut projects = sink.list_projects().await?;
    projects.sort_by(|a, b| a.name.cmp(&b.name));

    if projects.is_empty() {
        writeln!(writer, "No projects in the workspace.")?;
        return Ok(());
    }

    for project in projects {
        let marker = if project.archived { " (archived)" } else { "" };
        writeln!(writer, "- {} [{}]{marker}", project.name, project.id)?;
    }

    Ok(())
}

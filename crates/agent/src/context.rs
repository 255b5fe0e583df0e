//! Context-file loading.
//!
//! Files are re-read on every request so edits made mid-conversation (by
//! the agent itself or by the user) are visible to the next turn.

use patchloom_config::Config;
use patchloom_core::agent::AgentDefinition;

/// The context-file section appended to the system instructions: the
/// configured header followed by the contents of the global and per-agent
/// context files, de-duplicated, in first-listed order. Unreadable files
/// contribute empty strings rather than failing the request. Empty when no
/// files are configured.
pub async fn context_section(config: &Config, definition: &AgentDefinition) -> String {
    let mut files: Vec<&str> = Vec::new();
    for file in config
        .context_files
        .files
        .iter()
        .chain(definition.context_files.iter())
    {
        if !files.contains(&file.as_str()) {
            files.push(file);
        }
    }
    if files.is_empty() {
        return String::new();
    }

    let mut contents = Vec::with_capacity(files.len());
    for file in files {
        contents.push(tokio::fs::read_to_string(file).await.unwrap_or_default());
    }

    format!(
        "\n\n{}\n\n{}",
        config.context_files.prompt_header,
        contents.join("\n\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(files: Vec<String>) -> Config {
        let mut config = Config::default_config();
        config.context_files.prompt_header = "Project context:".into();
        config.context_files.files = files;
        config
    }

    fn definition_with(files: Vec<String>) -> AgentDefinition {
        AgentDefinition {
            context_files: files,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn no_files_means_no_section() {
        let section = context_section(&config_with(vec![]), &definition_with(vec![])).await;
        assert_eq!(section, "");
    }

    #[tokio::test]
    async fn global_and_agent_files_unioned_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.md");
        std::fs::write(&a, "alpha").unwrap();
        std::fs::write(&b, "beta").unwrap();

        let config = config_with(vec![a.to_str().unwrap().into()]);
        let definition = definition_with(vec![b.to_str().unwrap().into()]);
        let section = context_section(&config, &definition).await;
        assert_eq!(section, "\n\nProject context:\n\nalpha\n\nbeta");
    }

    #[tokio::test]
    async fn duplicate_paths_read_once() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.md");
        std::fs::write(&a, "alpha").unwrap();
        let path: String = a.to_str().unwrap().into();

        let config = config_with(vec![path.clone()]);
        let definition = definition_with(vec![path]);
        let section = context_section(&config, &definition).await;
        assert_eq!(section, "\n\nProject context:\n\nalpha");
    }

    #[tokio::test]
    async fn unreadable_file_contributes_empty_string() {
        let config = config_with(vec!["/definitely/missing.md".into()]);
        let section = context_section(&config, &definition_with(vec![])).await;
        assert_eq!(section, "\n\nProject context:\n\n");
    }
}

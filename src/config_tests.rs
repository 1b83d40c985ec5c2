#[cfg(test)]
mod tests {
    use crate::config::{Config, Settings};
    use crate::error::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
settings:
  cooldown_secs: 30
  authorized_operators:
    - ops@example.com
groups:
  - id: billing
    name: Billing Stack
    restart_label: Restart billing services
    targets:
      - hostname: win-app-01
        display_name: App Server 01
        services:
          - name: W3SVC
            display_name: IIS Web Server
          - name: BillingSvc
            display_name: Billing Engine
      - hostname: win-db-01
        display_name: DB Server 01
        services:
          - name: MSSQLSERVER
            display_name: SQL Server
"#;

    fn load(contents: &str) -> Result<Config> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        Config::load(Some(file.path().to_path_buf()))
    }

    #[test]
    fn test_sample_config_loads() -> Result<()> {
        let config = load(SAMPLE)?;

        assert_eq!(config.groups.len(), 1);
        let group = config.group("billing").expect("group exists");
        assert_eq!(group.name, "Billing Stack");
        assert_eq!(group.targets.len(), 2);
        assert_eq!(group.service_total(), 3);
        assert_eq!(group.targets[0].service_names(), vec!["W3SVC", "BillingSvc"]);

        // Overridden setting and defaults side by side
        assert_eq!(config.settings.cooldown_secs, 30);
        assert_eq!(config.settings.status_timeout_secs, 60);
        assert_eq!(config.settings.restart_timeout_secs, 300);
        assert_eq!(config.settings.max_workers, 4);
        assert_eq!(config.settings.runner, "ansible-playbook");

        Ok(())
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.status_timeout_secs, 60);
        assert_eq!(settings.restart_timeout_secs, 300);
        assert_eq!(settings.cooldown_secs, 60);
        assert_eq!(settings.max_workers, 4);
        assert!(settings.authorized_operators.is_empty());
    }

    #[test]
    fn test_authorization_allowlist() -> Result<()> {
        let config = load(SAMPLE)?;
        assert!(config.settings.is_authorized("ops@example.com"));
        assert!(!config.settings.is_authorized("guest@example.com"));
        assert!(!config.settings.is_authorized(""));
        Ok(())
    }

    #[test]
    fn test_unknown_group_lookup() -> Result<()> {
        let config = load(SAMPLE)?;
        assert!(config.group("nonexistent").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_file_errors() {
        let result = Config::load(Some("/nonexistent/svcherd.yaml".into()));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_groups_rejected() {
        let result = load("groups: []\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_group_id_rejected() {
        let yaml = r#"
groups:
  - id: a
    name: A
    restart_label: Restart A
    targets:
      - hostname: host-1
        display_name: Host 1
        services:
          - name: Svc
            display_name: Svc
  - id: a
    name: A again
    restart_label: Restart A again
    targets:
      - hostname: host-2
        display_name: Host 2
        services:
          - name: Svc
            display_name: Svc
"#;
        assert!(load(yaml).is_err());
    }

    #[test]
    fn test_duplicate_hostname_rejected() {
        let yaml = r#"
groups:
  - id: a
    name: A
    restart_label: Restart A
    targets:
      - hostname: host-1
        display_name: Host 1
        services:
          - name: Svc
            display_name: Svc
      - hostname: host-1
        display_name: Host 1 again
        services:
          - name: Other
            display_name: Other
"#;
        assert!(load(yaml).is_err());
    }

    #[test]
    fn test_target_without_services_rejected() {
        let yaml = r#"
groups:
  - id: a
    name: A
    restart_label: Restart A
    targets:
      - hostname: host-1
        display_name: Host 1
        services: []
"#;
        assert!(load(yaml).is_err());
    }

    #[test]
    fn test_config_default_path() {
        let path = Config::default_path();
        assert!(path.is_ok());

        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("svcherd"));
        assert!(path.to_string_lossy().contains("config.yaml"));
    }
}

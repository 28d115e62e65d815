//! Applying config-file defaults to parsed CLI options

use super::Cli;

/// Apply config file defaults to CLI options.
/// CLI flags always override config values.
pub(crate) fn apply_config_defaults(cli: &mut Cli, config: &jade::config::Config) {
    if cli.test_dir.is_none() {
        cli.test_dir = Some(config.test_dir_or_default(&cli.project_dir));
    }
    if cli.build_tool.is_none() {
        cli.build_tool = Some(config.build_tool_or_default());
    }
    if !cli.quiet && config.quiet_or_default() {
        cli.quiet = true;
    }
    if !cli.verbose && config.verbose_or_default() {
        cli.verbose = true;
    }
    // --verbose on the command line beats quiet = true in a config file
    if cli.verbose {
        cli.quiet = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use jade::config::Config;
    use jade::runner::BuildTool;
    use std::path::PathBuf;

    #[test]
    fn test_cli_flags_win() {
        let mut cli = Cli::parse_from(["jade", "--build-tool", "gradle", "--test-dir", "t"]);
        let config = Config {
            build_tool: Some(BuildTool::Maven),
            test_dir: Some(PathBuf::from("other")),
            ..Default::default()
        };
        apply_config_defaults(&mut cli, &config);
        assert_eq!(cli.build_tool, Some(BuildTool::Gradle));
        assert_eq!(cli.test_dir, Some(PathBuf::from("t")));
    }

    #[test]
    fn test_config_fills_gaps() {
        let mut cli = Cli::parse_from(["jade", "--project-dir", "/proj"]);
        let config = Config {
            build_tool: Some(BuildTool::Gradle),
            quiet: Some(true),
            ..Default::default()
        };
        apply_config_defaults(&mut cli, &config);
        assert_eq!(cli.build_tool, Some(BuildTool::Gradle));
        assert_eq!(cli.test_dir, Some(PathBuf::from("/proj/src/test/java")));
        assert!(cli.quiet);
    }
}

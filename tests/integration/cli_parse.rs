use canopy::tooling::cli::{Cli, Commands, OutputFormat};
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("canopy").chain(args.iter().copied())).unwrap()
}

#[test]
fn create_with_parent() {
    let cli = parse(&["create", "About Us", "--parent", "3", "--position", "2"]);
    match cli.command {
        Commands::Create {
            title,
            parent,
            position,
            unpublished,
            ..
        } => {
            assert_eq!(title, "About Us");
            assert_eq!(parent, Some(3));
            assert_eq!(position, 2);
            assert!(!unpublished);
        }
        _ => panic!("expected create"),
    }
}

#[test]
fn update_published_flag() {
    let cli = parse(&["update", "4", "--published", "false"]);
    match cli.command {
        Commands::Update { id, published, title, .. } => {
            assert_eq!(id, 4);
            assert_eq!(published, Some(false));
            assert_eq!(title, None);
        }
        _ => panic!("expected update"),
    }
}

#[test]
fn move_to_top() {
    let cli = parse(&["move", "5", "--top"]);
    match cli.command {
        Commands::Move { id, parent, top } => {
            assert_eq!(id, 5);
            assert_eq!(parent, None);
            assert!(top);
        }
        _ => panic!("expected move"),
    }
}

#[test]
fn move_rejects_parent_and_top_together() {
    let result = Cli::try_parse_from(["canopy", "move", "1", "--parent", "2", "--top"]);
    assert!(result.is_err());
}

#[test]
fn global_flags_and_defaults() {
    let cli = parse(&["--log-level", "debug", "--workspace", "/tmp/ws", "verify"]);
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert_eq!(cli.workspace, std::path::PathBuf::from("/tmp/ws"));
    match cli.command {
        Commands::Verify { format } => assert_eq!(format, OutputFormat::Text),
        _ => panic!("expected verify"),
    }
}

#[test]
fn non_numeric_id_rejected() {
    assert!(Cli::try_parse_from(["canopy", "delete", "abc"]).is_err());
}

#[test]
fn json_format_selected() {
    let cli = parse(&["descendants", "2", "--format", "json"]);
    match cli.command {
        Commands::Descendants { id, format } => {
            assert_eq!(id, 2);
            assert_eq!(format, OutputFormat::Json);
        }
        _ => panic!("expected descendants"),
    }
}

#[test]
fn unknown_format_rejected() {
    assert!(Cli::try_parse_from(["canopy", "show", "1", "--format", "yaml"]).is_err());
    assert!(Cli::try_parse_from(["canopy", "verify", "--format", "xml"]).is_err());
}

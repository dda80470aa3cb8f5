use std::path::PathBuf;

use bakta_db::Result;
use bakta_db::commands::{ask, import_gff, import_json, import_tsv, list_genomes, run_sql};
use bakta_db::config::{run_interactive_config, show_config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bakta-db")]
#[command(about = "Import Bakta genome-annotation files into a queryable SQLite database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the database path and LLM settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Import Bakta TSV annotation files from a folder
    ImportTsv {
        /// Folder containing TSV files
        folder: PathBuf,
        /// File pattern to match
        #[arg(long, default_value = "*.tsv")]
        pattern: String,
        /// SQLite database file
        #[arg(long, env = "BAKTA_DB_PATH")]
        db_path: Option<PathBuf>,
    },
    /// Import GFF3 annotation files from a folder
    ImportGff {
        /// Folder containing GFF3 files
        folder: PathBuf,
        /// File pattern to match
        #[arg(long, default_value = "*.gff3")]
        pattern: String,
        /// SQLite database file
        #[arg(long, env = "BAKTA_DB_PATH")]
        db_path: Option<PathBuf>,
    },
    /// Import annotation JSON documents from a folder
    ImportJson {
        /// Folder containing JSON files
        folder: PathBuf,
        /// File pattern to match
        #[arg(long, default_value = "*.json")]
        pattern: String,
        /// SQLite database file
        #[arg(long, env = "BAKTA_DB_PATH")]
        db_path: Option<PathBuf>,
    },
    /// Execute a SQL script file against the database
    RunSql {
        /// SQL script to execute
        script: PathBuf,
        /// SQLite database file
        #[arg(long, env = "BAKTA_DB_PATH")]
        db_path: Option<PathBuf>,
    },
    /// Ask a natural-language question about the imported annotations
    Ask {
        /// Question text
        #[arg(required = true)]
        question: Vec<String>,
        /// SQLite database file
        #[arg(long, env = "BAKTA_DB_PATH")]
        db_path: Option<PathBuf>,
    },
    /// List imported genomes
    List {
        /// SQLite database file
        #[arg(long, env = "BAKTA_DB_PATH")]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::ImportTsv {
            folder,
            pattern,
            db_path,
        } => {
            import_tsv(&folder, &pattern, db_path.as_deref()).await?;
        }
        Commands::ImportGff {
            folder,
            pattern,
            db_path,
        } => {
            import_gff(&folder, &pattern, db_path.as_deref()).await?;
        }
        Commands::ImportJson {
            folder,
            pattern,
            db_path,
        } => {
            import_json(&folder, &pattern, db_path.as_deref()).await?;
        }
        Commands::RunSql { script, db_path } => {
            run_sql(&script, db_path.as_deref()).await?;
        }
        Commands::Ask { question, db_path } => {
            ask(&question.join(" "), db_path.as_deref()).await?;
        }
        Commands::List { db_path } => {
            list_genomes(db_path.as_deref()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["bakta-db", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::List { .. });
        }
    }

    #[test]
    fn import_tsv_defaults() {
        let cli = Cli::try_parse_from(["bakta-db", "import-tsv", "/data/annotations"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::ImportTsv {
                folder,
                pattern,
                db_path,
            } = parsed.command
            {
                assert_eq!(folder, PathBuf::from("/data/annotations"));
                assert_eq!(pattern, "*.tsv");
                assert_eq!(db_path, None);
            }
        }
    }

    #[test]
    fn import_gff_with_flags() {
        let cli = Cli::try_parse_from([
            "bakta-db",
            "import-gff",
            "/data/gff",
            "--pattern",
            "*.gff",
            "--db-path",
            "/tmp/test.db",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::ImportGff {
                folder,
                pattern,
                db_path,
            } = parsed.command
            {
                assert_eq!(folder, PathBuf::from("/data/gff"));
                assert_eq!(pattern, "*.gff");
                assert_eq!(db_path, Some(PathBuf::from("/tmp/test.db")));
            }
        }
    }

    #[test]
    fn import_tsv_requires_folder() {
        let cli = Cli::try_parse_from(["bakta-db", "import-tsv"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn ask_collects_question_words() {
        let cli = Cli::try_parse_from(["bakta-db", "ask", "how", "many", "genes?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { question, .. } = parsed.command {
                assert_eq!(question.join(" "), "how many genes?");
            }
        }
    }

    #[test]
    fn ask_requires_a_question() {
        let cli = Cli::try_parse_from(["bakta-db", "ask"]);
        assert!(cli.is_err());
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["bakta-db", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["bakta-db", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["bakta-db", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}

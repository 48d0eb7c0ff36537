// CLI application
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use swaphud_cli::commands::{launch, parse_hex, parse_rgb, set_config, show_config, LaunchOptions};
use swaphud_core::config::{DEFAULT_CONFIG_PATH, DEFAULT_FONT_PATH};
use swaphud_core::Corner;

#[derive(Parser)]
#[command(name = "swaphud")]
#[command(about = "Frame rate and CPU overlay for OpenGL applications")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Position {
    TopLeft,
    TopRight,
}

impl From<Position> for Corner {
    fn from(position: Position) -> Self {
        match position {
            Position::TopLeft => Corner::TopLeft,
            Position::TopRight => Corner::TopRight,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective overlay settings
    Show {
        /// Settings file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change overlay settings
    Set {
        /// Settings file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Screen corner for the status line
        #[arg(short, long, value_enum)]
        position: Option<Position>,

        /// Text colour as R,G,B in [0, 1]
        #[arg(long, value_parser = parse_rgb, conflicts_with = "hex")]
        color: Option<[f32; 3]>,

        /// Text colour as #RRGGBB
        #[arg(long, value_parser = parse_hex)]
        hex: Option<[f32; 3]>,
    },
    /// Run a program with the overlay injected
    Launch {
        /// Settings file passed to the overlay
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Font file passed to the overlay
        #[arg(short, long, default_value = DEFAULT_FONT_PATH)]
        font: PathBuf,

        /// Preload library (default: next to this executable)
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Do not wait for the program to exit
        #[arg(long)]
        detach: bool,

        /// Program to run
        program: OsString,

        /// Arguments for the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show { config, json } => show_config(&config, json)?,
        Commands::Set {
            config,
            position,
            color,
            hex,
        } => {
            let saved = set_config(&config, position.map(Corner::from), color.or(hex))?;
            let [r, g, b] = saved.color;
            println!(
                "Saved {}: position = {}, color = {:.3}, {:.3}, {:.3}",
                config.display(),
                saved.corner,
                r,
                g,
                b
            );
        }
        Commands::Launch {
            config,
            font,
            library,
            detach,
            program,
            args,
        } => {
            let options = LaunchOptions {
                config,
                font,
                library,
                detach,
                program,
                args,
            };
            if let Some(code) = launch(&options)? {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

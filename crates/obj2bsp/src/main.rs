use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bsp_compiler::normalize::DEFAULT_TARGET_SIZE;
use bsp_compiler::{convert_file, ConvertConfig, RangePolicy, PLANE_EPSILON};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

#[derive(Parser)]
#[command(name = "obj2bsp", about = "Compile a Wavefront OBJ mesh into a BSP asset")]
struct Cli {
    /// Input .obj file
    input: PathBuf,
    /// Output asset file
    output: PathBuf,
    /// Size of the largest model extent after scaling
    #[arg(default_value_t = DEFAULT_TARGET_SIZE)]
    target_size: f32,
    /// Plane classification tolerance
    #[arg(long, default_value_t = PLANE_EPSILON)]
    epsilon: f32,
    /// Fail instead of warning when coordinates exceed the fixed-point range
    #[arg(long)]
    strict_range: bool,
    /// Keep the original coordinates (no centering or scaling)
    #[arg(long)]
    no_normalize: bool,
}

impl Cli {
    fn config(&self) -> ConvertConfig {
        let range_policy = if self.strict_range {
            RangePolicy::Abort
        } else {
            RangePolicy::Warn
        };
        ConvertConfig::default()
            .with_target_size(self.target_size)
            .with_epsilon(self.epsilon)
            .with_normalize(!self.no_normalize)
            .with_range_policy(range_policy)
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let stats = convert_file(&cli.input, &cli.output, &cli.config()).with_context(|| {
        format!(
            "failed to compile {} into {}",
            cli.input.display(),
            cli.output.display()
        )
    })?;
    info!(
        "{} vertices, {} faces, {} nodes (depth {}), {} bytes written to {}",
        stats.vertex_count,
        stats.face_count,
        stats.node_count,
        stats.depth,
        stats.byte_len,
        cli.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_and_defaults() {
        let cli = Cli::parse_from(["obj2bsp", "in.obj", "out.bin"]);
        let config = cli.config();
        assert_eq!(config, ConvertConfig::default());
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "obj2bsp",
            "in.obj",
            "out.bin",
            "25",
            "--epsilon",
            "0.001",
            "--strict-range",
            "--no-normalize",
        ]);
        let config = cli.config();
        assert_eq!(config.target_size, 25.0);
        assert_eq!(config.epsilon, 0.001);
        assert_eq!(config.range_policy, RangePolicy::Abort);
        assert!(!config.normalize);
    }
}

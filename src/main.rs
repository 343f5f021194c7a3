// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use vendpack::{PackOptions, UnpackOptions, Whitelist};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            dir,
            pkg,
            var_name,
            output,
            output_data_file,
            run_go_mod_tidy,
            run_go_mod_vendor,
            module_whitelist,
            rm_non_whitelist_vendors,
            keep_timestamps,
        } => {
            let opts = PackOptions::new()
                .with_mod_tidy(run_go_mod_tidy)
                .with_mod_vendor(run_go_mod_vendor)
                .with_whitelist(Whitelist::new(module_whitelist))
                .with_remove_non_whitelisted(rm_non_whitelist_vendors)
                .with_clear_timestamps(!keep_timestamps);
            commands::cmd_pack(
                &dir,
                &pkg,
                &var_name,
                &output,
                output_data_file.as_deref(),
                &opts,
            )
        }
        Commands::Unpack {
            dir,
            input_data_file,
            ignore_sums,
            force_upgrade_all,
            force_upgrade,
            optional_sum,
            non_vendor_host_dir,
        } => {
            let mut opts = UnpackOptions::new()
                .with_ignore_sums(ignore_sums)
                .with_force_upgrade_all(force_upgrade_all);
            for module in force_upgrade {
                opts = opts.with_force_upgrade_module(module);
            }
            for module in optional_sum {
                opts = opts.with_optional_sum_module(module);
            }
            if let Some(host) = non_vendor_host_dir {
                opts = opts.with_non_vendor_host_dir(std::path::absolute(host)?);
            }
            commands::cmd_unpack(&dir, &input_data_file, &opts)
        }
        Commands::Version => commands::cmd_version(),
    }
}

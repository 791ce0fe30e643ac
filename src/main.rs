//! cloud-catalog - inspect and validate cloud catalogs
//!
//! Loads a catalog file (or the bundled one) and answers the same queries
//! the library exposes.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cloud_catalog::{Catalog, CatalogLoader, Cloud, SourceFormat};

#[derive(Parser)]
#[command(name = "cloud-catalog")]
#[command(author, version, about = "Inspect and validate cloud catalogs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Catalog file (JSON or YAML); the bundled catalog is used when unset
    #[arg(short, long, env = "CLOUD_CATALOG_PATH", global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the catalog and report what it contains
    Validate,
    /// List clouds
    Clouds,
    /// Show instance types, versions and flavor groups of one cloud
    Show {
        /// Keystone hostname of the cloud
        hostname: String,
    },
    /// Find the display group of a flavor
    FlavorGroup {
        /// Keystone hostname of the cloud
        hostname: String,
        /// Flavor name (e.g., m3.large)
        flavor: String,
    },
    /// List versions that can run on a flavor
    Compatible {
        /// Keystone hostname of the cloud
        hostname: String,
        /// Flavor id
        flavor_id: String,
    },
    /// Print the catalog in document form
    Export {
        #[arg(long, default_value = "json")]
        format: SourceFormat,
    },
}

fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_logging(verbosity: u8) {
    let level = log_level(verbosity);

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact();

    // RUST_LOG wins over -v when set
    let result = match EnvFilter::try_from_default_env() {
        Ok(filter) => tracing::subscriber::set_global_default(
            builder.with_env_filter(filter).finish(),
        ),
        Err(_) => tracing::subscriber::set_global_default(builder.finish()),
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn print_cloud(cloud: &Cloud) {
    println!("{} [{}]", cloud.display_name(), cloud.keystone_hostname());
    if let Some(proxy) = cloud.user_app_proxy() {
        println!("  app proxy: {}", proxy);
    }
    if let Some(filter) = cloud.image_exclude_filter() {
        println!(
            "  image filter: {}={}",
            filter.filter_key(),
            filter.filter_value()
        );
    }
    if let Some(prefix) = cloud.featured_image_name_prefix() {
        println!("  featured prefix: {}", prefix);
    }

    for instance_type in cloud.instance_types() {
        println!("  {}", instance_type.friendly_name());
        for version in instance_type.versions() {
            let marker = if version.is_primary() { "*" } else { " " };
            let flavors = match version.restrict_flavor_ids() {
                Some(ids) => format!("{} flavors", ids.len()),
                None => "any flavor".to_string(),
            };
            println!(
                "   {} {} ({}; {})",
                marker,
                version.friendly_name(),
                version.image_filters(),
                flavors
            );
        }
    }

    for group in cloud.flavor_groups() {
        println!("  group '{}' matches {}", group.title(), group.match_on());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut loader = CatalogLoader::new();
    if let Some(path) = &cli.catalog {
        debug!("Using catalog file {}", path.display());
        loader = loader.with_path(path);
    }
    let catalog: Catalog = loader.load().await?;

    match cli.command.unwrap_or(Commands::Validate) {
        Commands::Validate => {
            let instance_types: usize = catalog
                .clouds()
                .iter()
                .map(|c| c.instance_types().len())
                .sum();
            println!(
                "ok: {} clouds, {} instance types",
                catalog.len(),
                instance_types
            );
        }
        Commands::Clouds => {
            for cloud in catalog.clouds() {
                println!("{}\t{}", cloud.keystone_hostname(), cloud.display_name());
            }
        }
        Commands::Show { hostname } => {
            print_cloud(catalog.find_cloud_by_hostname(&hostname)?);
        }
        Commands::FlavorGroup { hostname, flavor } => {
            let cloud = catalog.find_cloud_by_hostname(&hostname)?;
            let group = cloud.match_flavor_group(&flavor)?;
            match group.description() {
                Some(description) => println!("{}: {}", group.title(), description),
                None => println!("{}", group.title()),
            }
        }
        Commands::Compatible {
            hostname,
            flavor_id,
        } => {
            let cloud = catalog.find_cloud_by_hostname(&hostname)?;
            for (instance_type, version) in cloud.compatible_versions(&flavor_id) {
                println!(
                    "{}\t{}",
                    instance_type.friendly_name(),
                    version.friendly_name()
                );
            }
        }
        Commands::Export { format } => {
            let text = match format {
                SourceFormat::Json => catalog.to_json_string()?,
                SourceFormat::Yaml => catalog.to_yaml_string()?,
            };
            println!("{}", text);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(log_level(0), Level::INFO);
        assert_eq!(log_level(1), Level::DEBUG);
        assert_eq!(log_level(2), Level::TRACE);
        assert_eq!(log_level(5), Level::TRACE);
    }

    #[test]
    fn test_parse_export_format() {
        let cli = Cli::try_parse_from(["cloud-catalog", "-v", "export", "--format", "yaml"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Some(Commands::Export {
                format: SourceFormat::Yaml
            })
        ));
    }
}

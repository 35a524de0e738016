use clap::Subcommand;
use pomogrande_core::storage::{read_field, Database, StorageKey, Store};
use pomogrande_core::{BlockList, Config};

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum SitesAction {
    /// Block a site while focusing
    Block {
        /// Host name, e.g. "youtube.com"
        site: String,
    },
    /// Stop blocking a site
    Unblock { site: String },
    /// Exempt an exact URL from blocking
    Allow { url: String },
    /// Remove an exemption
    Disallow { url: String },
    /// Print the block list as JSON
    List,
    /// Report whether a URL would be blocked
    Check { url: String },
}

/// Unset lists fall back to the configured defaults.
fn load(db: &Database) -> Result<BlockList, Box<dyn std::error::Error>> {
    let blocked_sites = match read_field(db, StorageKey::BlockedSites)? {
        Some(sites) => sites,
        None => Config::load_or_default().defaults.blocked_sites,
    };
    Ok(BlockList {
        blocked_sites,
        allowed_urls: read_field(db, StorageKey::AllowedUrls)?.unwrap_or_default(),
    })
}

fn normalize_site(site: &str) -> String {
    let site = site.trim().to_ascii_lowercase();
    site.strip_prefix("www.").map(str::to_string).unwrap_or(site)
}

fn save_list(db: &Database, key: StorageKey, values: &[String]) -> CliResult {
    db.set(key, serde_json::to_value(values)?)?;
    Ok(())
}

pub fn run(action: SitesAction) -> CliResult {
    let db = open_store()?;
    let mut list = load(&db)?;
    match action {
        SitesAction::Block { site } => {
            let site = normalize_site(&site);
            if !list.blocked_sites.contains(&site) {
                list.blocked_sites.push(site);
            }
            save_list(&db, StorageKey::BlockedSites, &list.blocked_sites)?;
            print_json(&list)
        }
        SitesAction::Unblock { site } => {
            let site = normalize_site(&site);
            list.blocked_sites.retain(|s| *s != site);
            save_list(&db, StorageKey::BlockedSites, &list.blocked_sites)?;
            print_json(&list)
        }
        SitesAction::Allow { url } => {
            if !list.allowed_urls.contains(&url) {
                list.allowed_urls.push(url);
            }
            save_list(&db, StorageKey::AllowedUrls, &list.allowed_urls)?;
            print_json(&list)
        }
        SitesAction::Disallow { url } => {
            list.allowed_urls.retain(|u| *u != url);
            save_list(&db, StorageKey::AllowedUrls, &list.allowed_urls)?;
            print_json(&list)
        }
        SitesAction::List => print_json(&list),
        SitesAction::Check { url } => {
            println!("{}", if list.is_blocked(&url) { "blocked" } else { "allowed" });
            Ok(())
        }
    }
}

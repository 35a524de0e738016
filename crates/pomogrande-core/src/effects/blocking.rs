use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use super::{write_json, SiteBlocker};
use crate::error::EffectError;

/// Sites to block while focusing, and exact URLs exempt from blocking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockList {
    pub blocked_sites: Vec<String>,
    pub allowed_urls: Vec<String>,
}

impl BlockList {
    /// An allowed URL is never blocked; otherwise the host, minus a leading
    /// `www.`, must equal one of the blocked sites.
    pub fn is_blocked(&self, raw_url: &str) -> bool {
        let Ok(url) = Url::parse(raw_url) else {
            return false;
        };
        if self.allowed_urls.iter().any(|allowed| allowed == url.as_str()) {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.strip_prefix("www.").unwrap_or(host);
        self.blocked_sites.iter().any(|site| site == host)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockingState<'a> {
    active: bool,
    #[serde(flatten)]
    list: &'a BlockList,
}

/// Publishes blocking requests as `blocking.json` for an external enforcer.
pub struct FileSiteBlocker {
    path: PathBuf,
    list: BlockList,
}

impl FileSiteBlocker {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            list: BlockList::default(),
        }
    }
}

impl SiteBlocker for FileSiteBlocker {
    fn enable(&mut self, list: &BlockList) -> Result<(), EffectError> {
        self.list = list.clone();
        write_json(
            &self.path,
            &BlockingState {
                active: true,
                list: &self.list,
            },
        )
    }

    fn disable(&mut self) -> Result<(), EffectError> {
        write_json(
            &self.path,
            &BlockingState {
                active: false,
                list: &self.list,
            },
        )
    }
}

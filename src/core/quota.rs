//! Usage Quota Module
//!
//! Per-user, per-day invocation accounting for the on-demand "web surfing"
//! generation path, with access-mode policy on top. Counters are persisted
//! after every single increment — a crash can lose at most the in-flight
//! one — and records older than 30 days are swept opportunistically once per
//! calendar month.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date-key format of the usage store. Lexicographic order equals
/// chronological order.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Retention window for usage records.
const RETENTION_DAYS: u64 = 30;

/// Usage store filename under the data directory.
const USAGE_FILE: &str = "surfing_usage.json";

// ============================================================================
// Access Policy
// ============================================================================

/// Who may invoke the on-demand path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Open,
    OwnerOnly,
    Allowlist,
}

/// Read-only policy supplied by configuration per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfingPolicy {
    pub access_mode: AccessMode,
    /// Owner identity for `OwnerOnly` mode.
    pub master_qq: String,
    /// Allowed identities for `Allowlist` mode.
    pub whitelist: Vec<String>,
    /// Daily per-user invocation cap; 0 disables the check.
    pub daily_limit: u32,
}

impl Default for SurfingPolicy {
    fn default() -> Self {
        Self {
            access_mode: AccessMode::Open,
            master_qq: String::new(),
            whitelist: Vec::new(),
            daily_limit: 3,
        }
    }
}

/// Why an invocation was denied. The rendered message is user-visible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuotaDenied {
    #[error("❌ 此功能仅限主人使用")]
    OwnerOnly,

    #[error("❌ 您不在白名单中，无法使用此功能")]
    NotWhitelisted,

    #[error("❌ 今日使用次数已达上限（{limit}次），请明天再试")]
    DailyLimitReached { limit: u32 },
}

/// Per-user usage summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub total_usage: u32,
    pub today_usage: u32,
    /// Last 7 days, most recent first, including zero days.
    pub recent_days: Vec<(String, u32)>,
}

// ============================================================================
// Quota Manager
// ============================================================================

type UsageMap = HashMap<String, BTreeMap<String, u32>>;

/// Daily usage quota manager backed by a JSON file.
///
/// A single mutex serializes every read-modify-write, so concurrent on-demand
/// invocations cannot lose increments. The file is fully rewritten on every
/// mutation; no lock is ever held across an await point because the API is
/// synchronous.
pub struct SurfingQuota {
    usage_file: PathBuf,
    data: Mutex<UsageMap>,
}

impl SurfingQuota {
    /// Open (or lazily create) the usage store under `data_dir`. A missing or
    /// unreadable file degrades to an empty store with a logged error.
    pub fn new(data_dir: &Path) -> Self {
        if let Err(e) = std::fs::create_dir_all(data_dir) {
            log::error!("创建数据目录失败：{e}");
        }
        let usage_file = data_dir.join(USAGE_FILE);
        let data = match std::fs::read_to_string(&usage_file) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(data) => data,
                Err(e) => {
                    log::error!("加载上网冲浪使用数据失败：{e}");
                    UsageMap::new()
                }
            },
            Err(_) => UsageMap::new(),
        };
        Self {
            usage_file,
            data: Mutex::new(data),
        }
    }

    /// Check access mode first, then today's count against the daily limit.
    /// An access-mode veto short-circuits before the quota is consulted.
    pub fn check_permission(&self, user_id: &str, policy: &SurfingPolicy) -> Result<(), QuotaDenied> {
        match policy.access_mode {
            AccessMode::Open => {}
            AccessMode::OwnerOnly => {
                if user_id != policy.master_qq {
                    return Err(QuotaDenied::OwnerOnly);
                }
            }
            AccessMode::Allowlist => {
                if !policy.whitelist.iter().any(|w| w == user_id) {
                    return Err(QuotaDenied::NotWhitelisted);
                }
            }
        }

        if policy.daily_limit > 0 && self.today_usage(user_id) >= policy.daily_limit {
            return Err(QuotaDenied::DailyLimitReached {
                limit: policy.daily_limit,
            });
        }

        Ok(())
    }

    /// Record one invocation for today and persist immediately.
    pub fn record_usage(&self, user_id: &str) {
        self.record_usage_on(user_id, Local::now().date_naive());
    }

    fn record_usage_on(&self, user_id: &str, today: NaiveDate) {
        let date_key = today.format(DATE_FORMAT).to_string();
        {
            let mut data = self.data.lock().unwrap();
            *data
                .entry(user_id.to_string())
                .or_default()
                .entry(date_key)
                .or_insert(0) += 1;
            self.save(&data);
        }

        // Monthly opportunistic sweep: quota decisions only ever consult
        // "today", so retention precision is not critical.
        if today.day0() == 0 {
            self.cleanup_expired_on(today);
        }
    }

    /// Today's count for a user.
    pub fn today_usage(&self, user_id: &str) -> u32 {
        self.usage_on(user_id, Local::now().date_naive())
    }

    fn usage_on(&self, user_id: &str, date: NaiveDate) -> u32 {
        let date_key = date.format(DATE_FORMAT).to_string();
        let data = self.data.lock().unwrap();
        data.get(user_id)
            .and_then(|days| days.get(&date_key))
            .copied()
            .unwrap_or(0)
    }

    /// Remaining invocations today; `-1` means unlimited.
    pub fn remaining(&self, user_id: &str, policy: &SurfingPolicy) -> i64 {
        if policy.daily_limit == 0 {
            return -1;
        }
        i64::from(policy.daily_limit).saturating_sub(i64::from(self.today_usage(user_id)))
            .max(0)
    }

    /// Per-user summary over the last 7 days.
    pub fn usage_statistics(&self, user_id: &str) -> UsageStatistics {
        let today = Local::now().date_naive();
        let data = self.data.lock().unwrap();
        let days = data.get(user_id);

        let total_usage = days.map(|d| d.values().sum()).unwrap_or(0);
        let today_key = today.format(DATE_FORMAT).to_string();
        let today_usage = days.and_then(|d| d.get(&today_key)).copied().unwrap_or(0);

        let mut recent_days = Vec::with_capacity(7);
        for back in 0..7u64 {
            if let Some(date) = today.checked_sub_days(Days::new(back)) {
                let key = date.format(DATE_FORMAT).to_string();
                let count = days.and_then(|d| d.get(&key)).copied().unwrap_or(0);
                recent_days.push((key, count));
            }
        }

        UsageStatistics {
            total_usage,
            today_usage,
            recent_days,
        }
    }

    /// Wholesale-delete one user's record and persist.
    pub fn reset_user(&self, user_id: &str) {
        let mut data = self.data.lock().unwrap();
        if data.remove(user_id).is_some() {
            self.save(&data);
        }
    }

    /// Snapshot of every user's record, for admin reporting.
    pub fn all_usage(&self) -> UsageMap {
        self.data.lock().unwrap().clone()
    }

    /// Drop records older than the retention window and persist.
    pub fn cleanup_expired(&self) {
        self.cleanup_expired_on(Local::now().date_naive());
    }

    fn cleanup_expired_on(&self, today: NaiveDate) {
        let Some(cutoff) = today.checked_sub_days(Days::new(RETENTION_DAYS)) else {
            return;
        };
        let cutoff_key = cutoff.format(DATE_FORMAT).to_string();

        let mut data = self.data.lock().unwrap();
        for days in data.values_mut() {
            days.retain(|date, _| date.as_str() >= cutoff_key.as_str());
        }
        data.retain(|_, days| !days.is_empty());
        self.save(&data);
    }

    /// Full-file rewrite; write errors are logged, not propagated — the
    /// in-memory counters stay authoritative for this session.
    fn save(&self, data: &UsageMap) {
        match serde_json::to_string_pretty(data) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.usage_file, json) {
                    log::error!("保存上网冲浪使用数据失败：{e}");
                }
            }
            Err(e) => log::error!("保存上网冲浪使用数据失败：{e}"),
        }
    }
}

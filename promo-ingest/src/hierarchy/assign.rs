//! Per-agent assignment with compensating rollback

use promo_common::config::EngineConfig;
use promo_common::db::{Area, Role};
use promo_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::credentials::hash_secret;
use crate::db::accounts::{self, AccountFields};
use crate::db::promoters::{self, PromoterLink, UnlinkedPromoter};
use crate::normalize::canonical_area;

/// Sequence numbers skipped per agent before giving up on taken emails
const MAX_TAKEN_NUMBERS: usize = 50;

/// Per-area employee sequence
///
/// Seeded from identifiers already issued so a later run continues the
/// numbering. A number is consumed only by [`SequenceCounters::commit`].
#[derive(Debug, Clone, Default)]
pub struct SequenceCounters {
    last: HashMap<Area, u32>,
}

impl SequenceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from existing identifiers such as `KAB007`
    pub fn from_existing<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counters = Self::new();
        for id in ids {
            for area in Area::ALL {
                let Some(digits) = id.strip_prefix(area.prefix()) else {
                    continue;
                };
                if let Ok(n) = digits.parse::<u32>() {
                    let last = counters.last.entry(area).or_insert(0);
                    *last = (*last).max(n);
                }
            }
        }
        counters
    }

    /// Identifier the next agent in `area` would receive
    pub fn peek(&self, area: Area) -> String {
        let next = self.last.get(&area).copied().unwrap_or(0) + 1;
        format!("{}{:03}", area.prefix(), next)
    }

    /// Consume the number returned by [`SequenceCounters::peek`]
    pub fn commit(&mut self, area: Area) {
        *self.last.entry(area).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedAgent {
    pub name: String,
    pub employee_id: String,
    pub area: Area,
}

/// Agent left for manual follow-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAgent {
    pub name: String,
    pub area: Area,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAgent {
    pub name: String,
    pub message: String,
    /// The account created for this agent was removed again
    pub rolled_back: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentReport {
    pub considered: usize,
    pub assigned: Vec<AssignedAgent>,
    pub skipped: Vec<SkippedAgent>,
    pub failed: Vec<FailedAgent>,
    /// Agents whose store area label matched no rule
    pub fallback_area: usize,
}

impl fmt::Display for AssignmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hierarchy assignment")?;
        writeln!(f, "  considered:     {}", self.considered)?;
        writeln!(f, "  assigned:       {}", self.assigned.len())?;
        writeln!(f, "  skipped:        {}", self.skipped.len())?;
        writeln!(f, "  failed:         {}", self.failed.len())?;
        write!(f, "  area fallback:  {}", self.fallback_area)?;
        for s in &self.skipped {
            write!(f, "\n  SKIP {} ({}): {}", s.name, s.area, s.reason)?;
        }
        for x in &self.failed {
            let note = if x.rolled_back { " [account rolled back]" } else { "" };
            write!(f, "\n  FAIL {}: {}{}", x.name, x.message, note)?;
        }
        Ok(())
    }
}

enum AgentResult {
    Assigned(AssignedAgent),
    Skipped(SkippedAgent),
    Failed(FailedAgent),
}

/// Assign area, employee identifier, supervisor and account to every
/// promoter without a linked account
///
/// Per-agent failures are recorded in the report; only a failure to load
/// the work list is returned as `Err`.
pub async fn assign_hierarchy(pool: &SqlitePool, config: &EngineConfig) -> Result<AssignmentReport> {
    let agents = promoters::load_unlinked(pool).await?;
    let issued = promoters::employee_ids(pool).await?;
    let mut counters = SequenceCounters::from_existing(issued.iter().map(String::as_str));

    let mut report = AssignmentReport {
        considered: agents.len(),
        ..Default::default()
    };
    info!(count = agents.len(), "Assigning hierarchy to unlinked promoters");

    for agent in &agents {
        match assign_one(pool, config, agent, &mut counters, &mut report.fallback_area).await {
            AgentResult::Assigned(a) => report.assigned.push(a),
            AgentResult::Skipped(s) => report.skipped.push(s),
            AgentResult::Failed(f) => report.failed.push(f),
        }
    }

    info!(
        assigned = report.assigned.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Hierarchy assignment finished"
    );
    Ok(report)
}

async fn assign_one(
    pool: &SqlitePool,
    config: &EngineConfig,
    agent: &UnlinkedPromoter,
    counters: &mut SequenceCounters,
    fallback_count: &mut usize,
) -> AgentResult {
    let assignment = canonical_area(agent.store_area_label.as_deref());
    let area = assignment.area;
    if assignment.fallback {
        *fallback_count += 1;
        warn!(
            promoter = %agent.name,
            label = ?agent.store_area_label,
            area = %area,
            "Store area label unmatched, using fallback area"
        );
    }

    let supervisor = match lookup_supervisor(pool, config, area).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            warn!(promoter = %agent.name, area = %area, "No supervisor account for area, skipping");
            return AgentResult::Skipped(SkippedAgent {
                name: agent.name.clone(),
                area,
                reason: format!("no supervisor account for {}", area),
            });
        }
        Err(e) => return failed(agent, e.to_string(), false),
    };

    let fresh = agent.employee_id.is_none();
    let pin_hash = match hash_secret(&config.default_pin, Role::Promoter, config.bcrypt_cost) {
        Ok(h) => h,
        Err(e) => return failed(agent, e.to_string(), false),
    };

    // A taken email burns its number; the next one is tried
    let mut taken = 0;
    let (employee_id, account_id) = loop {
        let employee_id = match &agent.employee_id {
            Some(existing) => existing.clone(),
            None => counters.peek(area),
        };
        let email = format!("{}@{}", employee_id.to_lowercase(), config.account_domain);
        let created = accounts::insert_account(
            pool,
            &AccountFields {
                email: &email,
                name: &agent.name,
                role: Role::Promoter,
                area: Some(area),
                sator: agent.sator.as_deref(),
                secret_hash: &pin_hash,
            },
        )
        .await;

        match created {
            Ok(id) => break (employee_id, id),
            Err(e) if fresh && e.is_unique_violation() && taken < MAX_TAKEN_NUMBERS => {
                warn!(promoter = %agent.name, email = %email, "Account email already taken, skipping number");
                counters.commit(area);
                taken += 1;
            }
            Err(e) => {
                warn!(promoter = %agent.name, error = %e, "Account creation failed");
                return failed(agent, format!("account creation failed: {}", e), false);
            }
        }
    };

    let link = PromoterLink {
        employee_id: &employee_id,
        area,
        user_id: &account_id,
        pin_hash: &pin_hash,
        supervisor_id: &supervisor,
    };
    let cause = match promoters::link_promoter(pool, &agent.id, &link).await {
        Ok(true) => {
            if fresh {
                counters.commit(area);
            }
            debug!(promoter = %agent.name, employee_id = %employee_id, area = %area, "Promoter linked");
            return AgentResult::Assigned(AssignedAgent {
                name: agent.name.clone(),
                employee_id,
                area,
            });
        }
        Ok(false) => "promoter was linked by another run".to_string(),
        Err(e) => format!("promoter update failed: {}", e),
    };

    warn!(promoter = %agent.name, cause = %cause, "Rolling back created account");
    let rolled_back = match accounts::delete_account(pool, &account_id).await {
        Ok(n) => n == 1,
        Err(e) => {
            error!(promoter = %agent.name, account_id = %account_id, error = %e, "Rollback failed, account orphaned");
            false
        }
    };
    failed(agent, cause, rolled_back)
}

async fn lookup_supervisor(pool: &SqlitePool, config: &EngineConfig, area: Area) -> Result<Option<String>> {
    let Some(key) = config.supervisor_key(area) else {
        return Ok(None);
    };
    let key = key.trim().to_lowercase();
    Ok(accounts::find_by_email(pool, &key).await?.map(|a| a.id))
}

fn failed(agent: &UnlinkedPromoter, message: String, rolled_back: bool) -> AgentResult {
    AgentResult::Failed(FailedAgent {
        name: agent.name.clone(),
        message,
        rolled_back,
    })
}

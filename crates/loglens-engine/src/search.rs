use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use loglens_index::MessageHit;
use loglens_ingest::read_events;
use loglens_types::{Actor, SourceKind, VisibilityKind};
use serde::Serialize;

use crate::Result;
use crate::engine::Engine;

/// Caps for a search run. One verbose session must not drown the results,
/// and the total list stays bounded regardless of corpus size.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub total_limit: usize,
    pub per_session_limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            total_limit: 160,
            per_session_limit: 3,
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMessage {
    pub session_id: String,
    pub source: SourceKind,
    pub file_path: String,
    pub role: Actor,
    pub text: String,
    /// Line index in the source file, for deep-linking into the timeline
    pub position: usize,
    pub score: f64,
    /// True when the hit came from the raw-scan fallback rather than the
    /// full-text index
    pub from_fallback: bool,
}

/// Recency half-life: a session unmodified for this many days contributes
/// half the recency weight of one modified now.
const RECENCY_HALF_LIFE_DAYS: f64 = 7.0;
const RECENCY_WEIGHT: f64 = 2.0;

/// Bonus when the first keyword hit falls near the start of the message.
const EARLY_POSITION_WINDOW: usize = 80;
const EARLY_POSITION_BONUS: f64 = 0.5;

impl Engine {
    /// Ranked multi-keyword search over indexed messages.
    ///
    /// Matching is conjunctive: every keyword must appear in a message.
    /// Ranking blends text relevance (bm25), session recency, and an
    /// early-position bonus; ties break toward recency. When the index
    /// yields nothing (or is unavailable) the raw session files are scanned
    /// directly so unindexed sessions stay searchable.
    pub fn search(
        &self,
        query: &str,
        options: SearchOptions,
        fallback_roots: &[(SourceKind, PathBuf)],
    ) -> Result<Vec<RankedMessage>> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let match_expr = build_match_expr(&tokens);
        // Overfetch so the per-session cap does not starve the total cap.
        let candidate_limit = options.total_limit.saturating_mul(4).max(64);

        let hits = match self.db().search_messages(&match_expr, candidate_limit) {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!(error = %err, "full-text search unavailable, scanning raw files");
                Vec::new()
            }
        };

        if hits.is_empty() {
            return self.raw_scan(&tokens, options, fallback_roots);
        }

        Ok(rank_hits(hits, &tokens, options, Utc::now()))
    }

    /// Fallback path: decode and classify raw session files, matching by
    /// case-insensitive substring over extracted messages. Higher latency,
    /// but catches sessions the index has not reached yet.
    fn raw_scan(
        &self,
        tokens: &[String],
        options: SearchOptions,
        fallback_roots: &[(SourceKind, PathBuf)],
    ) -> Result<Vec<RankedMessage>> {
        let mut files: Vec<(String, PathBuf, SourceKind)> = Vec::new();
        let mut seen = HashSet::new();

        for (session_id, file_path) in self.db().all_session_files()? {
            let path = PathBuf::from(&file_path);
            if seen.insert(path.clone()) {
                let source = loglens_ingest::detect_source(&path);
                files.push((session_id, path, source));
            }
        }

        for discovered in self.scan(fallback_roots)? {
            if seen.insert(discovered.path.clone()) {
                let session_id = loglens_types::session_id_from_path(&discovered.path);
                files.push((session_id, discovered.path, discovered.source));
            }
        }

        let mut results = Vec::new();
        let mut per_session: HashMap<String, usize> = HashMap::new();

        'files: for (session_id, path, source) in files {
            let outcome = match read_events(&path, &self.classifier, &session_id, None) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "fallback scan skipped file");
                    continue;
                }
            };

            for event in &outcome.events {
                if !matches!(
                    event.kind,
                    VisibilityKind::User | VisibilityKind::Assistant
                ) {
                    continue;
                }
                let lower = event.text.to_lowercase();
                if !tokens.iter().all(|token| lower.contains(token)) {
                    continue;
                }

                let count = per_session.entry(session_id.clone()).or_insert(0);
                if *count >= options.per_session_limit {
                    continue;
                }
                *count += 1;

                results.push(RankedMessage {
                    session_id: session_id.clone(),
                    source: source.clone(),
                    file_path: path.to_string_lossy().to_string(),
                    role: event.actor,
                    text: event.text.clone(),
                    position: event.position,
                    score: 0.0,
                    from_fallback: true,
                });

                if results.len() >= options.total_limit {
                    break 'files;
                }
            }
        }

        Ok(results)
    }
}

pub(crate) fn tokenize(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = query
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(|c| c.to_lowercase())
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .collect();
    tokens.dedup();
    tokens
}

/// Conjunctive FTS5 match expression: every keyword as a quoted phrase,
/// joined with AND.
pub(crate) fn build_match_expr(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn rank_hits(
    hits: Vec<MessageHit>,
    tokens: &[String],
    options: SearchOptions,
    now: DateTime<Utc>,
) -> Vec<RankedMessage> {
    let mut scored: Vec<(f64, f64, MessageHit)> = hits
        .into_iter()
        .map(|hit| {
            let recency = recency_factor(hit.session_last_modified, now);
            let combined = combined_score(&hit, tokens, recency);
            (combined, recency, hit)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.2.session_id.cmp(&b.2.session_id))
            .then_with(|| a.2.position.cmp(&b.2.position))
    });

    let mut per_session: HashMap<String, usize> = HashMap::new();
    let mut results = Vec::new();

    for (combined, _, hit) in scored {
        let count = per_session.entry(hit.session_id.clone()).or_insert(0);
        if *count >= options.per_session_limit {
            continue;
        }
        *count += 1;

        results.push(RankedMessage {
            session_id: hit.session_id,
            source: hit.source,
            file_path: hit.file_path,
            role: hit.role,
            text: hit.text,
            position: hit.position,
            score: combined,
            from_fallback: false,
        });

        if results.len() >= options.total_limit {
            break;
        }
    }

    results
}

fn combined_score(hit: &MessageHit, tokens: &[String], recency: f64) -> f64 {
    // FTS5 bm25 is negative with smaller-is-better; negate so bigger wins.
    let relevance = -hit.score;

    let lower = hit.text.to_lowercase();
    let early_hit = tokens
        .iter()
        .filter_map(|token| lower.find(token.as_str()))
        .min()
        .is_some_and(|offset| offset < EARLY_POSITION_WINDOW);
    let position_bonus = if early_hit { EARLY_POSITION_BONUS } else { 0.0 };

    relevance + RECENCY_WEIGHT * recency + position_bonus
}

fn recency_factor(last_modified: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(ts) = last_modified else {
        return 0.0;
    };
    let age_days = (now - ts).num_seconds().max(0) as f64 / 86_400.0;
    0.5_f64.powf(age_days / RECENCY_HALF_LIFE_DAYS)
}

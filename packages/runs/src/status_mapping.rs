//! Status label mapping.
//!
//! Maps the free-text status labels found in backlog snapshots to the
//! canonical [`IncidentStatus`]. Snapshots are maintained by hand in
//! Portuguese or English, so matching is keyword based and case-insensitive.

use backlog_incident_models::IncidentStatus;

/// Maps a raw status label to an [`IncidentStatus`].
///
/// Returns [`IncidentStatus::Unknown`] when no mapping can be determined.
#[must_use]
pub fn map_status(raw: &str) -> IncidentStatus {
    let lower = raw.trim().to_lowercase();

    if lower.is_empty() {
        return IncidentStatus::Unknown;
    }

    // A bare "no" in the resolved column means the ticket is still open.
    if matches!(lower.as_str(), "não" | "nao" | "no")
        || contains_any(
            &lower,
            &["não resolvido", "nao resolvido", "not resolved", "unresolved"],
        )
    {
        return IncidentStatus::Open;
    }

    // ── Terminal statuses (check before "open" since "reaberto" etc.) ──
    if contains_any(&lower, &["fechado", "encerrado", "cancelado", "closed"]) {
        return IncidentStatus::Closed;
    }
    if contains_any(
        &lower,
        &[
            "resolvido",
            "concluido",
            "concluído",
            "finalizado",
            "resolved",
            "completed",
        ],
    ) || contains_word(&lower, &["done"])
    {
        return IncidentStatus::Resolved;
    }

    // ── Waiting ─────────────────────────────────────────────────────
    if contains_any(
        &lower,
        &["pendente", "pending", "aguardando", "waiting", "on hold"],
    ) {
        return IncidentStatus::Pending;
    }

    // ── Active ──────────────────────────────────────────────────────
    if contains_any(
        &lower,
        &[
            "em andamento",
            "andamento",
            "em atendimento",
            "in progress",
            "in-progress",
            "working",
        ],
    ) {
        return IncidentStatus::InProgress;
    }

    if contains_any(&lower, &["em aberto", "aberto", "novo"])
        || contains_word(&lower, &["open", "reopened", "new"])
    {
        return IncidentStatus::Open;
    }

    IncidentStatus::Unknown
}

/// Checks if `haystack` contains any of the given `needles`.
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Checks if any whole word of `haystack` equals one of `words`.
fn contains_word(haystack: &str, words: &[&str]) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| words.contains(&word))
}

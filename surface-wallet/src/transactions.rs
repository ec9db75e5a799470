//! Pending-transaction queue
//!
//! The confirmation screen walks through every unapproved transaction in
//! creation order. Transactions sharing a `group_id` have to be approved
//! one after another: only the first unconfirmed transaction of a group is
//! approvable.

use crate::types::{TransactionInfo, TxStatus};

/// Unapproved transactions sorted by creation time, oldest first.
pub fn pending_transactions(transactions: &[TransactionInfo]) -> Vec<&TransactionInfo> {
    let mut pending: Vec<_> = transactions
        .iter()
        .filter(|tx| tx.status.is_pending())
        .collect();
    pending.sort_by_key(|tx| tx.created_time);
    pending
}

/// View of the pending queue with the panel's selection applied.
#[derive(Debug, Clone)]
pub struct PendingQueue<'a> {
    pending: Vec<&'a TransactionInfo>,
    selected_id: Option<&'a str>,
}

impl<'a> PendingQueue<'a> {
    pub fn new(transactions: &'a [TransactionInfo], selected_id: Option<&'a str>) -> Self {
        Self {
            pending: pending_transactions(transactions),
            selected_id,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn transactions(&self) -> &[&'a TransactionInfo] {
        &self.pending
    }

    /// The selected pending transaction, or the first one when the
    /// selection is unset or no longer pending.
    pub fn selected(&self) -> Option<&'a TransactionInfo> {
        self.selected_id
            .and_then(|id| self.pending.iter().find(|tx| tx.id == id))
            .or_else(|| self.pending.first())
            .copied()
    }

    /// One-based position of the selected transaction, 0 when empty.
    pub fn position(&self) -> usize {
        self.selected()
            .and_then(|selected| self.pending.iter().position(|tx| tx.id == selected.id))
            .map_or(0, |index| index + 1)
    }

    /// Id to select after the current one, wrapping to the start.
    ///
    /// With no selection the first transaction counts as current.
    pub fn next_id(&self) -> Option<&'a str> {
        let current = match self.selected_id {
            Some(id) => self.pending.iter().position(|tx| tx.id == id),
            None => Some(0),
        };
        let next = current.map_or(0, |index| index + 1);
        let next = if next >= self.pending.len() { 0 } else { next };
        self.pending.get(next).map(|tx| tx.id.as_str())
    }

    /// Pending transactions of the selected transaction's group, oldest first.
    ///
    /// Empty when the selected transaction is not grouped.
    pub fn group(&self) -> Vec<&'a TransactionInfo> {
        let Some(group_id) = self.selected().and_then(|tx| tx.group_id.as_deref()) else {
            return Vec::new();
        };
        // `pending` is already sorted
        self.pending
            .iter()
            .filter(|tx| tx.group_id.as_deref() == Some(group_id))
            .copied()
            .collect()
    }

    /// Whether the transaction can be approved now: it is pending and is
    /// either ungrouped or the first unconfirmed transaction of its group.
    pub fn can_approve(&self, id: &str) -> bool {
        let Some(tx) = self.pending.iter().find(|tx| tx.id == id) else {
            return false;
        };
        let Some(group_id) = tx.group_id.as_deref() else {
            return true;
        };
        self.pending
            .iter()
            .filter(|t| t.group_id.as_deref() == Some(group_id))
            .find(|t| t.status != TxStatus::Confirmed)
            .is_none_or(|first| first.id == id)
    }

    pub fn can_approve_selected(&self) -> bool {
        self.selected().is_some_and(|tx| self.can_approve(&tx.id))
    }

    /// Ids of every pending transaction, for reject-all.
    pub fn ids(&self) -> Vec<String> {
        self.pending.iter().map(|tx| tx.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str, created_time: u64, status: TxStatus, group: Option<&str>) -> TransactionInfo {
        TransactionInfo {
            id: id.into(),
            status,
            created_time,
            group_id: group.map(Into::into),
            ..Default::default()
        }
    }

    fn sample() -> Vec<TransactionInfo> {
        vec![
            tx("c", 30, TxStatus::Unapproved, None),
            tx("a", 10, TxStatus::Unapproved, None),
            tx("done", 5, TxStatus::Confirmed, None),
            tx("b", 20, TxStatus::Unapproved, None),
        ]
    }

    #[test]
    fn test_pending_filtered_and_sorted() {
        let txs = sample();
        let ids: Vec<_> = pending_transactions(&txs).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_selected_defaults_to_first() {
        let txs = sample();
        let queue = PendingQueue::new(&txs, None);
        assert_eq!(queue.selected().map(|t| t.id.as_str()), Some("a"));
        assert_eq!(queue.position(), 1);
        assert_eq!(queue.len(), 3);

        let queue = PendingQueue::new(&txs, Some("done"));
        assert_eq!(queue.selected().map(|t| t.id.as_str()), Some("a"));

        let queue = PendingQueue::new(&txs, Some("b"));
        assert_eq!(queue.position(), 2);
    }

    #[test]
    fn test_next_wraps_around() {
        let txs = sample();
        assert_eq!(PendingQueue::new(&txs, None).next_id(), Some("b"));
        assert_eq!(PendingQueue::new(&txs, Some("b")).next_id(), Some("c"));
        assert_eq!(PendingQueue::new(&txs, Some("c")).next_id(), Some("a"));
        // Stale selection restarts at the beginning
        assert_eq!(PendingQueue::new(&txs, Some("gone")).next_id(), Some("a"));
        assert_eq!(PendingQueue::new(&[], None).next_id(), None);
    }

    #[test]
    fn test_empty_queue() {
        let queue = PendingQueue::new(&[], None);
        assert!(queue.is_empty());
        assert_eq!(queue.position(), 0);
        assert!(queue.selected().is_none());
        assert!(!queue.can_approve_selected());
    }

    #[test]
    fn test_group_approval_order() {
        let txs = vec![
            tx("g2", 20, TxStatus::Unapproved, Some("swap")),
            tx("g1", 10, TxStatus::Unapproved, Some("swap")),
            tx("solo", 15, TxStatus::Unapproved, None),
        ];

        let queue = PendingQueue::new(&txs, Some("g2"));
        let group: Vec<_> = queue.group().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(group, vec!["g1", "g2"]);
        assert!(!queue.can_approve_selected());
        assert!(queue.can_approve("g1"));
        assert!(queue.can_approve("solo"));
        assert!(!queue.can_approve("missing"));

        let queue = PendingQueue::new(&txs, Some("solo"));
        assert!(queue.group().is_empty());
        assert!(queue.can_approve_selected());
    }

    #[test]
    fn test_approved_group_member_unblocks_next() {
        let txs = vec![
            tx("g1", 10, TxStatus::Submitted, Some("swap")),
            tx("g2", 20, TxStatus::Unapproved, Some("swap")),
        ];
        let queue = PendingQueue::new(&txs, None);
        assert_eq!(queue.selected().map(|t| t.id.as_str()), Some("g2"));
        assert!(queue.can_approve_selected());
    }

    #[test]
    fn test_reject_all_ids() {
        let txs = sample();
        assert_eq!(PendingQueue::new(&txs, None).ids(), vec!["a", "b", "c"]);
    }
}

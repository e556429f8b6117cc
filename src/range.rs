/// ID-range admission control
///
/// The host's resolution chain may split identifier ranges across several
/// resolvers. A `RangeGate` carries the highest/lowest identifier this
/// resolver answers for; anything outside is declined as not-found before a
/// single byte goes over the wire.
use crate::error::ResolveResult;
use crate::lock::retry_lock;
use std::sync::Mutex;

/// Which end of the admitted identifier range a bound applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Highest,
    Lowest,
}

/// Configured bounds for one resource kind. Zero is the "no bound
/// configured" sentinel, not a bound of zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct RangeBounds {
    pub highest: i64,
    pub lowest: i64,
}

/// Mutex-guarded bounds shared by every caller in the process. All access
/// goes through the bounded lock retry; reads outside the lock are not
/// permitted.
#[derive(Debug, Default)]
pub struct RangeGate {
    bounds: Mutex<RangeBounds>,
}

impl RangeGate {
    pub fn set(&self, edge: Edge, value: i64) -> ResolveResult<()> {
        let mut bounds = retry_lock(&self.bounds)?;
        match edge {
            Edge::Highest => bounds.highest = value,
            Edge::Lowest => bounds.lowest = value,
        }
        Ok(())
    }

    pub fn get(&self, edge: Edge) -> ResolveResult<i64> {
        let bounds = retry_lock(&self.bounds)?;
        Ok(match edge {
            Edge::Highest => bounds.highest,
            Edge::Lowest => bounds.lowest,
        })
    }

    /// Whether this resolver may answer for `id`. Denied exactly when a
    /// configured (non-zero) bound is violated.
    pub fn admits(&self, id: i64) -> ResolveResult<bool> {
        let bounds = retry_lock(&self.bounds)?;
        if bounds.highest != 0 && id > bounds.highest {
            return Ok(false);
        }
        if bounds.lowest != 0 && id < bounds.lowest {
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_gate_admits_everything() {
        let gate = RangeGate::default();
        assert!(gate.admits(0).unwrap());
        assert!(gate.admits(1).unwrap());
        assert!(gate.admits(i64::MAX).unwrap());
        assert!(gate.admits(-500).unwrap());
    }

    #[test]
    fn test_highest_bound_denies_above() {
        let gate = RangeGate::default();
        gate.set(Edge::Highest, 2000).unwrap();
        assert!(gate.admits(2000).unwrap());
        assert!(gate.admits(1999).unwrap());
        assert!(!gate.admits(2001).unwrap());
    }

    #[test]
    fn test_lowest_bound_denies_below() {
        let gate = RangeGate::default();
        gate.set(Edge::Lowest, 1000).unwrap();
        assert!(gate.admits(1000).unwrap());
        assert!(gate.admits(5000).unwrap());
        assert!(!gate.admits(999).unwrap());
    }

    #[test]
    fn test_both_bounds_form_a_window() {
        let gate = RangeGate::default();
        gate.set(Edge::Lowest, 1000).unwrap();
        gate.set(Edge::Highest, 2000).unwrap();
        assert!(!gate.admits(999).unwrap());
        assert!(gate.admits(1500).unwrap());
        assert!(!gate.admits(2001).unwrap());
    }

    #[test]
    fn test_zero_resets_to_unbounded() {
        let gate = RangeGate::default();
        gate.set(Edge::Highest, 100).unwrap();
        assert!(!gate.admits(200).unwrap());
        gate.set(Edge::Highest, 0).unwrap();
        assert!(gate.admits(200).unwrap());
        assert_eq!(gate.get(Edge::Highest).unwrap(), 0);
    }
}

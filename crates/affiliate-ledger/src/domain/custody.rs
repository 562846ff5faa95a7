//! # Fund Custody
//!
//! Arithmetic behind `GlobalConfig.locked`, the amount the ledger keeps
//! earmarked in the custody account.
//!
//! Increases to a non-negative balance reserve one to one. Decreases only
//! release what was actually reserved, so a partner's pre-existing debt never
//! pays down untracked funds. All results are floored at zero.

use shared_types::{Asset, AssetError};

/// Change of `locked` caused by adding `delta` to a balance that was `prior`.
///
/// - positive `delta`: `+delta` if `prior > 0`, else `+max(prior + delta, 0)`
/// - negative `delta`: `max(delta, -prior)` if `prior > 0`, else nothing
pub fn reserve_delta(prior: Asset, delta: Asset) -> Result<Asset, AssetError> {
    let zero = Asset::zero(delta.symbol);
    if delta.is_positive() {
        if prior.is_positive() {
            Ok(delta)
        } else {
            Ok(prior.checked_add(delta)?.floor_zero())
        }
    } else if delta.is_negative() && prior.is_positive() {
        Ok(delta.max(prior.negated()))
    } else {
        Ok(zero)
    }
}

/// `locked + change`, floored at zero.
pub fn adjust(locked: Asset, change: Asset) -> Result<Asset, AssetError> {
    Ok(locked.checked_add(change)?.floor_zero())
}

/// `locked - amount`, floored at zero.
pub fn release(locked: Asset, amount: Asset) -> Result<Asset, AssetError> {
    Ok(locked.checked_sub(amount)?.floor_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::Symbol;

    fn eos(amount: i64) -> Asset {
        Asset::new(amount, Symbol::EOS).unwrap()
    }

    #[test]
    fn test_positive_delta_on_positive_balance() {
        assert_eq!(reserve_delta(eos(50), eos(30)).unwrap(), eos(30));
    }

    #[test]
    fn test_positive_delta_pays_down_debt_first() {
        assert_eq!(reserve_delta(eos(-50), eos(30)).unwrap(), eos(0));
        assert_eq!(reserve_delta(eos(-50), eos(80)).unwrap(), eos(30));
        assert_eq!(reserve_delta(eos(0), eos(80)).unwrap(), eos(80));
    }

    #[test]
    fn test_negative_delta_releases_at_most_prior() {
        assert_eq!(reserve_delta(eos(50), eos(-30)).unwrap(), eos(-30));
        assert_eq!(reserve_delta(eos(50), eos(-80)).unwrap(), eos(-50));
        assert_eq!(reserve_delta(eos(-10), eos(-80)).unwrap(), eos(0));
        assert_eq!(reserve_delta(eos(0), eos(-1)).unwrap(), eos(0));
    }

    #[test]
    fn test_release_floors_at_zero() {
        assert_eq!(release(eos(10), eos(30)).unwrap(), eos(0));
        assert_eq!(adjust(eos(10), eos(-30)).unwrap(), eos(0));
        assert_eq!(adjust(eos(10), eos(5)).unwrap(), eos(15));
    }

    /// The reservation change always equals the change of the positive part
    /// of the balance, across every sign transition.
    #[test]
    fn test_reserve_tracks_positive_part() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10_000 {
            let prior = eos(rng.gen_range(-1_000_000..=1_000_000));
            let delta = eos(rng.gen_range(-1_000_000..=1_000_000));
            let after = prior.checked_add(delta).unwrap();
            let expected = after.floor_zero().amount - prior.floor_zero().amount;
            assert_eq!(
                reserve_delta(prior, delta).unwrap().amount,
                expected,
                "prior={prior} delta={delta}"
            );
        }
    }
}

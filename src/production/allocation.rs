// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Allocation of the plant's monthly production to inverters, in proportion
//! to the number of modules each inverter hosts.

use std::collections::{BTreeMap, HashMap};

use super::{Month, MonthlySeries};
use crate::topology::InverterId;
use crate::Error;

/// Remainders closer than this are considered equal.
const REMAINDER_EPSILON: f64 = 1e-9;

/// Allocates every month of `system` to the inverters in `modules`, in
/// proportion to their module counts, rounded to `precision` decimals.
///
/// After rounding, the whole rounding difference of a month is assigned to a
/// single inverter, so that the inverters' values add up exactly to the
/// system value, itself rounded to `precision` decimals.  That inverter is the
/// one whose value lost the most to rounding in the direction of the
/// correction, the lowest identifier winning ties.
///
/// The target of each month is the system value rounded to `precision`
/// decimals, so the inverters of a 1001.6 kWh month add up to 1002 kWh at
/// precision 0.  System values already at the output precision are met
/// exactly.
pub(crate) fn allocate(
    system: &MonthlySeries,
    modules: &BTreeMap<InverterId, u64>,
    precision: u32,
    months: &[Month; 12],
) -> Result<BTreeMap<InverterId, MonthlySeries>, Error> {
    let total_modules: u64 = modules.values().sum();
    if total_modules == 0 {
        return Err(Error::reconciliation(
            "Can't allocate monthly production: no modules are assigned to any inverter.",
        ));
    }

    let scale = 10f64.powi(precision as i32);
    let mut allocated: BTreeMap<&InverterId, HashMap<Month, f64>> = BTreeMap::new();

    for (month, system_value) in system.iter() {
        let target = (system_value * scale).round() as i64;
        let raw = modules
            .iter()
            .map(|(id, &m)| (id, system_value * scale * m as f64 / total_modules as f64))
            .collect::<Vec<_>>();
        let mut rounded = raw.iter().map(|(_, r)| r.round() as i64).collect::<Vec<_>>();

        let diff = target - rounded.iter().sum::<i64>();
        if diff != 0 {
            let direction = diff.signum() as f64;
            let mut best: Option<(usize, f64)> = None;
            for (i, (_, r)) in raw.iter().enumerate() {
                let remainder = direction * (r - rounded[i] as f64);
                if best.map_or(true, |(_, b)| remainder > b + REMAINDER_EPSILON) {
                    best = Some((i, remainder));
                }
            }
            if let Some((i, _)) = best {
                rounded[i] += diff;
            }
        }

        for ((id, _), value) in raw.iter().zip(rounded) {
            allocated
                .entry(*id)
                .or_default()
                .insert(month, value as f64 / scale);
        }
    }

    Ok(modules
        .keys()
        .map(|id| {
            let values = allocated.remove(id).unwrap_or_default();
            (id.clone(), MonthlySeries::ordered(&values, months))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::MONTHS;

    fn modules(counts: &[(&str, u64)]) -> BTreeMap<InverterId, u64> {
        counts
            .iter()
            .map(|(id, m)| (InverterId::new(*id), *m))
            .collect()
    }

    fn system(values: &[(Month, f64)]) -> MonthlySeries {
        MonthlySeries::ordered(&values.iter().copied().collect(), &MONTHS)
    }

    #[test]
    fn test_proportional() {
        let result = allocate(
            &system(&[(Month::January, 1000.0), (Month::July, 3000.0)]),
            &modules(&[("INV01", 100), ("INV02", 300)]),
            0,
            &MONTHS,
        )
        .unwrap();
        let inv1 = &result[&InverterId::new("INV01")];
        assert_eq!(inv1.get(Month::January), Some(250.0));
        assert_eq!(inv1.get(Month::July), Some(750.0));
        assert_eq!(result[&InverterId::new("INV02")].get(Month::January), Some(750.0));
    }

    #[test]
    fn test_sums_match_system() {
        // Three equal shares of 1000 round to 333 each, one short.
        let result = allocate(
            &system(&[(Month::January, 1000.0), (Month::February, 1001.6)]),
            &modules(&[("INV03", 7), ("INV01", 7), ("INV02", 7)]),
            0,
            &MONTHS,
        )
        .unwrap();
        let jan = result
            .values()
            .map(|s| s.get(Month::January).unwrap())
            .collect::<Vec<_>>();
        // Ties go to the lowest identifier.
        assert_eq!(jan, vec![334.0, 333.0, 333.0]);

        // 1001.6 rounds to 1002; 333.87 rounds up for everyone to 1002.
        let feb_total: f64 = result
            .values()
            .map(|s| s.get(Month::February).unwrap())
            .sum();
        assert_eq!(feb_total, 1002.0);
    }

    #[test]
    fn test_negative_correction() {
        // Shares of 1/6, 1/6 and 2/3 of 100 round to 17 + 17 + 67 = 101.
        let result = allocate(
            &system(&[(Month::May, 100.0)]),
            &modules(&[("INV01", 1), ("INV02", 1), ("INV03", 4)]),
            0,
            &MONTHS,
        )
        .unwrap();
        let may = result
            .values()
            .map(|s| s.get(Month::May).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(may.iter().sum::<f64>(), 100.0);
        // All three gained a third from rounding up, so the first identifier
        // takes the correction.
        assert_eq!(may, vec![16.0, 17.0, 67.0]);
    }

    #[test]
    fn test_precision() {
        let result = allocate(
            &system(&[(Month::March, 10.0)]),
            &modules(&[("INV01", 1), ("INV02", 1), ("INV03", 1)]),
            2,
            &MONTHS,
        )
        .unwrap();
        let march = result
            .values()
            .map(|s| s.get(Month::March).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(march, vec![3.34, 3.33, 3.33]);
    }

    #[test]
    fn test_no_modules() {
        assert!(allocate(
            &system(&[(Month::March, 10.0)]),
            &modules(&[("INV01", 0)]),
            0,
            &MONTHS
        )
        .is_err_and(|e| e
            == Error::reconciliation(
                "Can't allocate monthly production: no modules are assigned to any inverter."
            )));
    }
}

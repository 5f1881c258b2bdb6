use crate::error::SolarError;
use crate::series::HourlySeries;
use crate::solar::SolarProduction;

/// Subtracts solar production from metered consumption for every metered hour.
///
/// Hours without a meter reading stay absent. Results can be negative when
/// production exceeds consumption.
pub fn net_consumption(
    raw: &HourlySeries,
    solar: &SolarProduction,
) -> Result<HourlySeries, SolarError> {
    raw.iter()
        .map(|(at, kwh)| solar.apply(at).map(|produced| (at, kwh - produced)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::hour;

    fn raw() -> HourlySeries {
        [
            (hour(2022, 1, 1, 3).unwrap(), 1.0),
            (hour(2022, 1, 1, 13).unwrap(), 0.5),
            (hour(2022, 1, 2, 9).unwrap(), 2.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn no_production_leaves_series_unchanged() {
        assert_eq!(net_consumption(&raw(), &SolarProduction::None).unwrap(), raw());
    }

    #[test]
    fn keeps_only_metered_hours_and_allows_export() {
        let net = net_consumption(&raw(), &SolarProduction::synthetic()).unwrap();
        assert_eq!(net.len(), 3);
        assert!(!net.contains(&hour(2022, 1, 1, 12).unwrap()));
        assert_eq!(net.get(&hour(2022, 1, 1, 3).unwrap()), Some(1.0));
        // 0.5 kWh metered against 1.9 kWh produced
        let exported = net.get(&hour(2022, 1, 1, 13).unwrap()).unwrap();
        assert!((exported + 1.4).abs() < 1e-9);
    }
}

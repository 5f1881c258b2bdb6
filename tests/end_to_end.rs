use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use spot_cost::loaders::{load_consumption, load_spot_prices};
use spot_cost::series::hour;
use spot_cost::{
    Config, PriceResolver, ReportError, SolarProduction, compute, monthly_production,
    net_consumption,
};

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Archive document with `wh` in every hour of `days` days starting at `start`.
fn archive_json(start: &str, days: u64, wh: f64) -> String {
    let mut values = String::new();
    for h in 0..days * 24 {
        if !values.is_empty() {
            values.push(',');
        }
        // one reading per 30 minutes
        write!(values, "\"{}\": {}, \"{}\": {}", h * 3600, wh / 2.0, h * 3600 + 1800, wh / 2.0)
            .unwrap();
    }
    format!(
        r#"{{"Body": {{"Data": {{"inverter/1": {{
            "Start": "{start}",
            "Data": {{"EnergyReal_WAC_Sum_Produced": {{"Unit": "Wh", "Values": {{{values}}}}}}}
        }}}}}}}}"#
    )
}

#[test]
fn flat_and_spot_costs_without_solar() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "prices.csv",
        "time,price\n2022-01-01 00:00:00,5.0\n2022-01-01 01:00:00,5.0\n",
    );
    write(
        dir.path(),
        "consumption.csv",
        "Time,kWh\n01/01/2022 00:00:00,10.0\n01/01/2022 01:00:00,10.0\n01/01/2022 02:00:00,\n",
    );
    write(
        dir.path(),
        "spot-cost.toml",
        r#"
            [sources]
            spot_prices = "prices.csv"
            consumption = "consumption.csv"

            [rates]
            flat_cents = [20.0]
        "#,
    );

    let config = Config::load(&dir.path().join("spot-cost.toml")).unwrap();
    let prices =
        load_spot_prices(&config.sources.spot_prices, &config.sources.spot_price_format).unwrap();
    let consumption =
        load_consumption(&config.sources.consumption, &config.sources.consumption_format).unwrap();
    let solar = config.solar.build().unwrap();
    assert_eq!(solar, SolarProduction::None);

    let net = net_consumption(&consumption, &solar).unwrap();
    let since = config.since_timestamps().unwrap()[0];
    let report = compute(&net, &prices, since, &config.report_settings()).unwrap();

    assert_eq!(report.hours, 2);
    assert_eq!(report.total_kwh, 20.0);
    assert_eq!(report.average_kwh, 10.0);
    assert!((report.flat_costs[0].cost - 4.0).abs() < 1e-9);
    assert!((report.spot_cost - 1.0).abs() < 1e-9);
    assert!((report.effective_spot_rate_cents - 5.0).abs() < 1e-9);
}

#[test]
fn daily_price_feed_falls_back_to_midnight() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "prices.csv",
        "time,price\n2022-06-15 00:00:00,8.0\n",
    );
    write(
        dir.path(),
        "consumption.csv",
        "Time,kWh\n06/15/2022 14:00:00,2.5\n",
    );
    let prices =
        load_spot_prices(&dir.path().join("prices.csv"), "%Y-%m-%d %H:%M:%S").unwrap();
    let consumption =
        load_consumption(&dir.path().join("consumption.csv"), "%m/%d/%Y %H:%M:%S").unwrap();

    let at = hour(2022, 6, 15, 14).unwrap();
    assert_eq!(prices.price_at(at), Ok(8.0));

    let report = compute(
        &consumption,
        &prices,
        hour(2022, 6, 1, 0).unwrap(),
        &Default::default(),
    )
    .unwrap();
    assert!((report.spot_cost - 0.2).abs() < 1e-9);
}

#[test]
fn measured_production_folds_onto_june() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "june-1.json",
        &archive_json("2022-06-01T00:00:00+03:00", 15, 400.0),
    );
    write(
        dir.path(),
        "june-2.json",
        &archive_json("2022-06-16T00:00:00+03:00", 15, 600.0),
    );
    write(
        dir.path(),
        "prices.csv",
        "time,price\n2022-07-31 00:00:00,10.0\n2022-12-01 00:00:00,10.0\n",
    );
    write(
        dir.path(),
        "consumption.csv",
        "Time,kWh\n07/31/2022 12:00:00,1.0\n12/01/2022 12:00:00,1.0\n",
    );
    write(
        dir.path(),
        "spot-cost.toml",
        r#"
            [sources]
            spot_prices = "prices.csv"
            consumption = "consumption.csv"

            [report]
            since = ["2022-07-01"]
            hourly_breakdown = true

            [rates]
            threshold_cents = 5.0

            [solar]
            mode = "measured"
            archives = ["june-1.json", "june-2.json"]
        "#,
    );

    let config = Config::load(&dir.path().join("spot-cost.toml")).unwrap();
    let solar = config.solar.build().unwrap();

    // July 31st reads June 30th, which lies in the second archive.
    assert_eq!(solar.apply(hour(2022, 7, 31, 12).unwrap()), Ok(0.6));
    assert_eq!(
        solar.apply(hour(2022, 7, 31, 12).unwrap()),
        solar.apply(hour(2022, 7, 30, 12).unwrap())
    );
    assert_eq!(solar.apply(hour(2022, 5, 3, 12).unwrap()), Ok(0.4));
    assert_eq!(solar.apply(hour(2022, 12, 1, 12).unwrap()), Ok(0.0));

    let summary = monthly_production(&solar, 2022).unwrap();
    let (_, june) = summary.months[5];
    assert!((june - (15.0 * 24.0 * 0.4 + 15.0 * 24.0 * 0.6)).abs() < 1e-6);

    let prices =
        load_spot_prices(&config.sources.spot_prices, &config.sources.spot_price_format).unwrap();
    let consumption =
        load_consumption(&config.sources.consumption, &config.sources.consumption_format).unwrap();
    let net = net_consumption(&consumption, &solar).unwrap();
    assert!((net.get(&hour(2022, 7, 31, 12).unwrap()).unwrap() - 0.4).abs() < 1e-9);
    assert_eq!(net.get(&hour(2022, 12, 1, 12).unwrap()), Some(1.0));

    let since = config.since_timestamps().unwrap()[0];
    let report = compute(&net, &prices, since, &config.report_settings()).unwrap();
    assert!((report.total_kwh - 1.4).abs() < 1e-9);
    assert_eq!(report.hourly_prices.len(), 1);
    assert_eq!(report.hourly_prices[0].hour, 12);
    assert_eq!(report.expensive_hours.len(), 2);
    assert_eq!(report.expensive_hours[0].at, hour(2022, 7, 31, 12).unwrap());
}

#[test]
fn failing_window_leaves_other_windows_intact() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "prices.csv",
        "time,price\n2022-01-01 00:00:00,5.0\n",
    );
    write(
        dir.path(),
        "consumption.csv",
        "Time,kWh\n01/01/2022 00:00:00,1.0\n",
    );
    let prices =
        load_spot_prices(&dir.path().join("prices.csv"), "%Y-%m-%d %H:%M:%S").unwrap();
    let net =
        load_consumption(&dir.path().join("consumption.csv"), "%m/%d/%Y %H:%M:%S").unwrap();

    let settings = Default::default();
    let later = hour(2022, 8, 29, 0).unwrap();
    assert_eq!(
        compute(&net, &prices, later, &settings),
        Err(ReportError::EmptyRange { since: later })
    );
    assert!(compute(&net, &prices, hour(2022, 1, 1, 0).unwrap(), &settings).is_ok());
}

#[test]
fn measured_production_rejects_other_years() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "june.json",
        &archive_json("2022-06-01T00:00:00+03:00", 1, 100.0),
    );
    write(
        dir.path(),
        "spot-cost.toml",
        r#"
            [sources]
            spot_prices = "prices.csv"
            consumption = "consumption.csv"

            [solar]
            mode = "measured"
            archives = ["june.json"]
        "#,
    );
    let config = Config::load(&dir.path().join("spot-cost.toml")).unwrap();
    let solar = config.solar.build().unwrap();

    let consumption = [(hour(2023, 6, 1, 12).unwrap(), 1.0)].into_iter().collect();
    assert!(net_consumption(&consumption, &solar).is_err());
}

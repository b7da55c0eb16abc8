//! Daily → weekly / monthly rollup.
//!
//! Accumulating variables (precipitation, snowfall) are summed per period,
//! everything else is averaged. The two reductions run as independent passes
//! keyed by period start and are then outer-joined, so a period seen by only
//! one pass still gets a single row.

use chrono::NaiveDate;
use clap::ValueEnum;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::dates::{month_start, week_start};
use crate::observation::Observation;

/// Variables whose period value is the sum of the daily values.
pub const ACCUMULATE_VARS: &[&str] = &["PRCP", "SNOW"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Frequency {
    /// Monday-anchored weeks
    Weekly,
    /// Calendar months
    Monthly,
}

impl Frequency {
    /// Start of the period containing `date`.
    pub fn bucket(self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Weekly => week_start(date),
            Frequency::Monthly => month_start(date),
        }
    }

    /// Name of the period column in the per-region table.
    pub fn label_column(self) -> &'static str {
        match self {
            Frequency::Weekly => "week_start",
            Frequency::Monthly => "month_start",
        }
    }

    /// File name of the per-region period table.
    pub fn table_file_name(self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly_selected_station.csv",
            Frequency::Monthly => "monthly_selected_station.csv",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reduction {
    Sum,
    Mean,
}

fn reduction_for(datatype: &str) -> Reduction {
    if ACCUMULATE_VARS.contains(&datatype) {
        Reduction::Sum
    } else {
        Reduction::Mean
    }
}

/// One period with one optional value per table column.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRow {
    pub start: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Wide period table: one row per period start, one column per variable.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTable {
    pub frequency: Frequency,
    pub columns: Vec<String>,
    pub rows: Vec<PeriodRow>,
}

impl PeriodTable {
    fn empty(frequency: Frequency) -> Self {
        Self {
            frequency,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `variable` for the period starting at `start`.
    pub fn value(&self, start: NaiveDate, variable: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == variable)?;
        let row = self.rows.iter().find(|r| r.start == start)?;
        row.values[col]
    }
}

type PeriodValues<'a> = BTreeMap<NaiveDate, BTreeMap<&'a str, f64>>;

/// Rolls daily observations up to `frequency` periods for `variables`.
///
/// Observations of other variables are ignored; if nothing is left the table
/// is empty. Columns keep the order of `variables`, limited to those present.
pub fn aggregate(
    observations: &[Observation],
    variables: &[String],
    frequency: Frequency,
) -> PeriodTable {
    let wanted: HashSet<&str> = variables.iter().map(String::as_str).collect();
    let (to_sum, to_average): (Vec<&Observation>, Vec<&Observation>) = observations
        .iter()
        .filter(|o| wanted.contains(o.datatype.as_str()))
        .partition(|o| reduction_for(&o.datatype) == Reduction::Sum);

    if to_sum.is_empty() && to_average.is_empty() {
        return PeriodTable::empty(frequency);
    }

    let sums = reduce(&to_sum, frequency, Reduction::Sum);
    let means = reduce(&to_average, frequency, Reduction::Mean);
    let joined = outer_join(means, sums);

    let present: HashSet<&str> = joined.values().flat_map(|r| r.keys().copied()).collect();
    let mut columns: Vec<String> = Vec::new();
    for var in variables {
        if present.contains(var.as_str()) && !columns.contains(var) {
            columns.push(var.clone());
        }
    }

    let rows = joined
        .into_iter()
        .map(|(start, record)| PeriodRow {
            start,
            values: columns
                .iter()
                .map(|c| record.get(c.as_str()).copied())
                .collect(),
        })
        .collect();

    PeriodTable {
        frequency,
        columns,
        rows,
    }
}

fn reduce<'a>(
    observations: &[&'a Observation],
    frequency: Frequency,
    reduction: Reduction,
) -> PeriodValues<'a> {
    let mut acc: BTreeMap<NaiveDate, BTreeMap<&'a str, (f64, usize)>> = BTreeMap::new();
    for &obs in observations {
        let slot = acc
            .entry(frequency.bucket(obs.date))
            .or_default()
            .entry(obs.datatype.as_str())
            .or_insert((0.0, 0));
        slot.0 += obs.value;
        slot.1 += 1;
    }

    acc.into_iter()
        .map(|(start, vars)| {
            let reduced = vars
                .into_iter()
                .map(|(var, (total, count))| {
                    let value = match reduction {
                        Reduction::Sum => total,
                        Reduction::Mean => total / count as f64,
                    };
                    (var, value)
                })
                .collect();
            (start, reduced)
        })
        .collect()
}

fn outer_join<'a>(left: PeriodValues<'a>, right: PeriodValues<'a>) -> PeriodValues<'a> {
    let mut joined = left;
    for (start, vars) in right {
        joined.entry(start).or_default().extend(vars);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::ymd;

    fn obs(date: NaiveDate, datatype: &str, value: f64) -> Observation {
        Observation {
            date,
            datatype: datatype.to_string(),
            station: "GHCND:USW00013876".to_string(),
            attributes: String::new(),
            value,
        }
    }

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        let table = aggregate(&[], &vars(&["PRCP"]), Frequency::Weekly);
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_no_matching_variables_gives_empty_table() {
        let data = vec![obs(ymd(2020, 1, 1), "WSF2", 10.0)];
        let table = aggregate(&data, &vars(&["PRCP", "TMAX"]), Frequency::Monthly);
        assert!(table.is_empty());
    }

    #[test]
    fn test_precipitation_is_summed_and_temperature_averaged() {
        let data = vec![
            obs(ymd(2020, 1, 6), "PRCP", 0.25),
            obs(ymd(2020, 1, 7), "PRCP", 0.5),
            obs(ymd(2020, 1, 8), "PRCP", 1.0),
            obs(ymd(2020, 1, 6), "TMAX", 40.0),
            obs(ymd(2020, 1, 7), "TMAX", 50.0),
        ];
        let table = aggregate(&data, &vars(&["PRCP", "TMAX"]), Frequency::Weekly);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.value(ymd(2020, 1, 6), "PRCP"), Some(1.75));
        assert_eq!(table.value(ymd(2020, 1, 6), "TMAX"), Some(45.0));
    }

    #[test]
    fn test_weekly_buckets_are_monday_anchored() {
        let data = vec![
            // Sunday 2020-01-05 belongs to the week of Monday 2019-12-30
            obs(ymd(2020, 1, 5), "SNOW", 1.0),
            obs(ymd(2020, 1, 6), "SNOW", 2.0),
            obs(ymd(2020, 1, 8), "SNOW", 3.0),
        ];
        let table = aggregate(&data, &vars(&["SNOW"]), Frequency::Weekly);

        let starts: Vec<_> = table.rows.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![ymd(2019, 12, 30), ymd(2020, 1, 6)]);
        assert_eq!(table.value(ymd(2020, 1, 6), "SNOW"), Some(5.0));
    }

    #[test]
    fn test_monthly_buckets_start_on_first() {
        let data = vec![
            obs(ymd(2021, 2, 1), "TAVG", 30.0),
            obs(ymd(2021, 2, 28), "TAVG", 40.0),
            obs(ymd(2021, 3, 15), "TAVG", 50.0),
        ];
        let table = aggregate(&data, &vars(&["TAVG"]), Frequency::Monthly);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.value(ymd(2021, 2, 1), "TAVG"), Some(35.0));
        assert_eq!(table.value(ymd(2021, 3, 1), "TAVG"), Some(50.0));
    }

    #[test]
    fn test_outer_join_keeps_one_sided_periods() {
        let data = vec![
            obs(ymd(2021, 1, 10), "PRCP", 2.0),
            obs(ymd(2021, 2, 10), "TMIN", 20.0),
        ];
        let table = aggregate(&data, &vars(&["TMIN", "PRCP"]), Frequency::Monthly);

        assert_eq!(table.columns, vars(&["TMIN", "PRCP"]));
        assert_eq!(
            table.rows,
            vec![
                PeriodRow { start: ymd(2021, 1, 1), values: vec![None, Some(2.0)] },
                PeriodRow { start: ymd(2021, 2, 1), values: vec![Some(20.0), None] },
            ]
        );
    }

    #[test]
    fn test_columns_follow_caller_order_and_skip_absent() {
        let data = vec![
            obs(ymd(2021, 1, 10), "TMAX", 1.0),
            obs(ymd(2021, 1, 10), "AWND", 2.0),
            obs(ymd(2021, 1, 10), "PRCP", 3.0),
        ];
        let table = aggregate(
            &data,
            &vars(&["PRCP", "SNOW", "TMAX", "AWND"]),
            Frequency::Monthly,
        );
        assert_eq!(table.columns, vars(&["PRCP", "TMAX", "AWND"]));
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let data = vec![
            obs(ymd(2022, 5, 2), "PRCP", 0.1),
            obs(ymd(2022, 5, 3), "TMAX", 70.0),
            obs(ymd(2022, 5, 20), "TMAX", 80.0),
        ];
        let wanted = vars(&["PRCP", "TMAX"]);
        assert_eq!(
            aggregate(&data, &wanted, Frequency::Weekly),
            aggregate(&data, &wanted, Frequency::Weekly)
        );
    }

    #[test]
    fn test_frequency_names() {
        assert_eq!(Frequency::Weekly.label_column(), "week_start");
        assert_eq!(Frequency::Monthly.table_file_name(), "monthly_selected_station.csv");
        assert_eq!(Frequency::Monthly.to_string(), "monthly");
    }
}

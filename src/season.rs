/*!
 * Deciding which months of each year make up the fire season, and remembering the decision.
 *
 * The decision is made by a [SeasonSelector], once per year, after the global threshold is known.
 * Whatever months it returns are taken as given; the only clean up done is removing duplicates.
 */

use crate::{
    error::FireSeasonError,
    month::Month,
    stats::SeasonThreshold,
    FireSeasonResult,
};
use log::{debug, info};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Fire Season Assignment
 *-----------------------------------------------------------------------------------------------*/

/// The fire season months confirmed for each year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FireSeasonAssignment {
    seasons: BTreeMap<i32, Vec<Month>>,
}

impl FireSeasonAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the season for `year`, replacing any earlier one. Order is kept, repeats dropped.
    pub fn insert(&mut self, year: i32, months: &[Month]) {
        let mut season: Vec<Month> = Vec::with_capacity(months.len());
        for &month in months {
            if !season.contains(&month) {
                season.push(month);
            }
        }

        self.seasons.insert(year, season);
    }

    pub fn get(&self, year: i32) -> Option<&[Month]> {
        self.seasons.get(&year).map(|s| s.as_slice())
    }

    /// The years with a recorded season, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.seasons.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &[Month])> {
        self.seasons.iter().map(|(y, s)| (*y, s.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    /**
     * Write the assignment as text, one line per year.
     *
     * ```text
     * 2001 : Jul, Aug, Sep
     * 2002 :
     * ```
     */
    pub fn write<W: Write>(&self, out: &mut W) -> FireSeasonResult<()> {
        for (year, season) in self.iter() {
            let codes: Vec<&str> = season.iter().map(|m| m.code()).collect();
            writeln!(out, "{} : {}", year, codes.join(", "))?;
        }

        Ok(())
    }

    /// Write the assignment to a file, creating parent directories as needed.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> FireSeasonResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;

        info!(target: "season", "fire seasons saved to {}", path.display());

        Ok(())
    }

    /// Parse the text written by [FireSeasonAssignment::write]. Blank lines are ignored.
    pub fn read<R: BufRead>(input: R) -> FireSeasonResult<Self> {
        let mut assignment = FireSeasonAssignment::new();

        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let invalid = || -> Box<dyn std::error::Error> {
                FireSeasonError::InvalidSeasonRecord {
                    line: line.clone(),
                }
                .into()
            };

            let (year, codes) = trimmed.split_once(':').ok_or_else(invalid)?;
            let year: i32 = year.trim().parse().map_err(|_| invalid())?;

            let months = codes
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(Month::parse_name)
                .collect::<FireSeasonResult<Vec<Month>>>()?;

            assignment.insert(year, &months);
        }

        Ok(assignment)
    }

    pub fn read_from<P: AsRef<Path>>(path: P) -> FireSeasonResult<Self> {
        let f = File::open(path.as_ref())?;
        Self::read(BufReader::new(f))
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                          Selectors
 *-----------------------------------------------------------------------------------------------*/

/**
 * Decides the fire season for one year.
 *
 * `series` holds the percent burned for each month of `year` in the order they were collected.
 * The call blocks until a decision is made. An error aborts the season assignment.
 */
pub trait SeasonSelector {
    fn select(
        &mut self,
        year: i32,
        series: &[(Month, f64)],
        threshold: SeasonThreshold,
    ) -> FireSeasonResult<Vec<Month>>;
}

/// Chooses every month burning more than the threshold, no human involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdSelector;

impl SeasonSelector for ThresholdSelector {
    fn select(
        &mut self,
        year: i32,
        series: &[(Month, f64)],
        threshold: SeasonThreshold,
    ) -> FireSeasonResult<Vec<Month>> {
        let months: Vec<Month> = series
            .iter()
            .filter(|(_, pct)| threshold.is_exceeded_by(*pct))
            .map(|(m, _)| *m)
            .collect();

        debug!(target: "season", "{}: {} months above {}", year, months.len(), threshold);

        Ok(months)
    }
}

/// Replays a previously saved assignment.
#[derive(Debug, Clone)]
pub struct RecordedSelector {
    assignment: FireSeasonAssignment,
}

impl RecordedSelector {
    pub fn new(assignment: FireSeasonAssignment) -> Self {
        RecordedSelector { assignment }
    }
}

impl SeasonSelector for RecordedSelector {
    fn select(
        &mut self,
        year: i32,
        _series: &[(Month, f64)],
        _threshold: SeasonThreshold,
    ) -> FireSeasonResult<Vec<Month>> {
        self.assignment
            .get(year)
            .map(|season| season.to_vec())
            .ok_or_else(|| FireSeasonError::SelectionAborted { year }.into())
    }
}

/**
 * Asks a person at a terminal.
 *
 * The monthly percentages are shown as a bar chart with the months above the threshold marked.
 * Month codes (or full names) are then entered, separated by commas or spaces, over as many lines
 * as needed. `undo` takes back the last month entered, which changes nothing if that month had
 * already been selected. An empty line or `done` confirms the selection. Reaching the end of the
 * input before confirming aborts the selection.
 */
pub struct ConsoleSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsoleSelector { input, output }
    }

    fn show_chart(
        &mut self,
        year: i32,
        series: &[(Month, f64)],
        threshold: SeasonThreshold,
    ) -> FireSeasonResult<()> {
        const BAR_WIDTH: f64 = 50.0;

        let max = series
            .iter()
            .map(|(_, pct)| *pct)
            .fold(threshold.value(), f64::max);
        let scale = if max > 0.0 { BAR_WIDTH / max } else { 0.0 };

        writeln!(self.output)?;
        writeln!(
            self.output,
            "Percent burned for {} (75th percentile over all years: {})",
            year, threshold
        )?;

        for &(month, pct) in series {
            let flag = if threshold.is_exceeded_by(pct) { '*' } else { ' ' };
            let bar = "#".repeat((pct * scale).round() as usize);
            writeln!(self.output, "{} {} {:>8.4}% |{}", flag, month, pct, bar)?;
        }

        writeln!(self.output, "  (* above the threshold)")?;
        writeln!(
            self.output,
            "Enter the fire season months for {} (e.g. Jul, Aug). 'undo' takes back the last \
             month entered, an empty line or 'done' finishes.",
            year
        )?;

        Ok(())
    }
}

impl<R: BufRead, W: Write> SeasonSelector for ConsoleSelector<R, W> {
    fn select(
        &mut self,
        year: i32,
        series: &[(Month, f64)],
        threshold: SeasonThreshold,
    ) -> FireSeasonResult<Vec<Month>> {
        self.show_chart(year, series, threshold)?;

        let mut selected: Vec<Month> = vec![];
        // One entry per month token, None when it repeated a month already selected.
        let mut entries: Vec<Option<Month>> = vec![];

        loop {
            write!(self.output, "{} > ", year)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(FireSeasonError::SelectionAborted { year }.into());
            }

            let tokens: Vec<&str> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .collect();

            if tokens.is_empty() || (tokens.len() == 1 && tokens[0].eq_ignore_ascii_case("done")) {
                break;
            }

            let mut entered = Vec::with_capacity(tokens.len());
            let mut rejected = None;
            for token in tokens {
                if token.eq_ignore_ascii_case("undo") {
                    entered.push(None);
                    continue;
                }

                match Month::parse_name(token) {
                    Ok(month) => entered.push(Some(month)),
                    Err(_) => {
                        rejected = Some(token);
                        break;
                    }
                }
            }

            if let Some(token) = rejected {
                writeln!(self.output, "Unknown month '{}', line ignored.", token)?;
                continue;
            }

            for month in entered {
                match month {
                    Some(month) if !selected.contains(&month) => {
                        selected.push(month);
                        entries.push(Some(month));
                    }
                    Some(_) => entries.push(None),
                    None => {
                        if let Some(Some(_)) = entries.pop() {
                            selected.pop();
                        }
                    }
                }
            }

            let codes: Vec<&str> = selected.iter().map(|m| m.code()).collect();
            writeln!(self.output, "Selected months: {}", codes.join(", "))?;
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn series() -> Vec<(Month, f64)> {
        vec![
            (Month::Jun, 1.0),
            (Month::Jul, 6.0),
            (Month::Aug, 9.0),
            (Month::Sep, 2.0),
        ]
    }

    fn console(input: &str) -> ConsoleSelector<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleSelector::new(Cursor::new(input.as_bytes().to_vec()), vec![])
    }

    #[test]
    fn test_assignment_text_format() {
        let mut assignment = FireSeasonAssignment::new();
        assignment.insert(2002, &[]);
        assignment.insert(2001, &[Month::Jul, Month::Aug, Month::Jul, Month::Sep]);

        let mut buf = vec![];
        assignment.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "2001 : Jul, Aug, Sep\n2002 : \n");

        let parsed = FireSeasonAssignment::read(Cursor::new(text)).unwrap();
        assert_eq!(parsed, assignment);
    }

    #[test]
    fn test_assignment_bad_records() {
        let err = FireSeasonAssignment::read(Cursor::new("2001 : Jul, Agu\n")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FireSeasonError>(),
            Some(FireSeasonError::UnrecognizedMonthCode { .. })
        ));

        let err = FireSeasonAssignment::read(Cursor::new("2001 Jul, Aug\n")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FireSeasonError>(),
            Some(FireSeasonError::InvalidSeasonRecord { .. })
        ));

        let err = FireSeasonAssignment::read(Cursor::new("two thousand : Jul\n")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FireSeasonError>(),
            Some(FireSeasonError::InvalidSeasonRecord { .. })
        ));
    }

    #[test]
    fn test_threshold_selector() {
        let months = ThresholdSelector
            .select(2001, &series(), SeasonThreshold(6.0))
            .unwrap();
        assert_eq!(months, vec![Month::Aug]);
    }

    #[test]
    fn test_recorded_selector() {
        let mut assignment = FireSeasonAssignment::new();
        assignment.insert(2001, &[Month::Aug]);
        let mut selector = RecordedSelector::new(assignment);

        assert_eq!(
            selector.select(2001, &[], SeasonThreshold(0.0)).unwrap(),
            vec![Month::Aug]
        );

        let err = selector.select(2002, &[], SeasonThreshold(0.0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FireSeasonError>(),
            Some(FireSeasonError::SelectionAborted { year: 2002 })
        ));
    }

    #[test]
    fn test_console_selection() {
        let mut selector = console("jul, August\nSep undo\n\n");
        let months = selector
            .select(2001, &series(), SeasonThreshold(5.0))
            .unwrap();
        assert_eq!(months, vec![Month::Jul, Month::Aug]);

        let shown = String::from_utf8(selector.output.clone()).unwrap();
        assert!(shown.contains("* Jul"));
        assert!(shown.contains("  Sep"));
    }

    #[test]
    fn test_console_undo_of_repeated_month() {
        let mut selector = console("Jul, Aug\nJul undo\nSep\nundo undo\n\n");
        let months = selector
            .select(2001, &series(), SeasonThreshold(5.0))
            .unwrap();
        assert_eq!(months, vec![Month::Jul]);
    }

    #[test]
    fn test_console_reprompts_on_unknown_month() {
        let mut selector = console("Jul Smarch\nAug\ndone\n");
        let months = selector
            .select(2001, &series(), SeasonThreshold(5.0))
            .unwrap();
        assert_eq!(months, vec![Month::Aug]);

        let shown = String::from_utf8(selector.output.clone()).unwrap();
        assert!(shown.contains("Unknown month 'Smarch'"));
    }

    #[test]
    fn test_console_aborts_at_end_of_input() {
        let mut selector = console("Jul, Aug\n");
        let err = selector
            .select(2001, &series(), SeasonThreshold(5.0))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FireSeasonError>(),
            Some(FireSeasonError::SelectionAborted { year: 2001 })
        ));
    }
}

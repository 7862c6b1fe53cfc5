use std::collections::HashSet;
use std::io::{BufRead, Write};

use anyhow::Result;

use crate::data::names::NameTable;
use crate::data::store::{DataStore, Metric};
use crate::plot::chart::ChartRenderer;

use super::console::Console;
use super::prompt::{select_hotkey, Selection};

/// Top-level interactive menu. Owns no data of its own; the store and name
/// table are built once at startup and borrowed here read-only.
pub struct App<'a, R, W, C> {
    store: &'a DataStore,
    names: &'a NameTable,
    console: Console<R, W>,
    renderer: C,
}

impl<'a, R: BufRead, W: Write, C: ChartRenderer> App<'a, R, W, C> {
    pub fn new(
        store: &'a DataStore,
        names: &'a NameTable,
        console: Console<R, W>,
        renderer: C,
    ) -> Self {
        App {
            store,
            names,
            console,
            renderer,
        }
    }

    /// Hands the console back, mainly so tests can inspect what was printed.
    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Runs the menu until the user exits (choice 3 or input EOF).
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.console.line("")?;
            self.console.line("Select an action:")?;
            self.console.line("1. Plot variable for a single hotkey")?;
            self.console.line("2. Plot all hotkeys")?;
            self.console.line("3. Exit")?;
            let choice = match self.console.prompt("Enter your choice: ")? {
                Some(line) => line,
                None => break,
            };
            match choice.as_str() {
                "1" => self.single_mode()?,
                "2" => self.compare_mode()?,
                "3" => break,
                _ => self
                    .console
                    .line("Invalid choice. Please enter a number between 1 and 3.")?,
            }
        }
        Ok(())
    }

    /// Pick one hotkey, then plot metrics for it until "Return to previous
    /// menu" -- the metric menu self-loops so several charts can be drawn
    /// without re-selecting the hotkey.
    fn single_mode(&mut self) -> Result<()> {
        let hotkeys = self.store.distinct_hotkeys();
        let hotkey = match select_hotkey(&mut self.console, &hotkeys, self.names)? {
            Selection::Hotkey(hotkey) => hotkey,
            Selection::Cancelled => return Ok(()),
        };
        while let Some(metric) = self.prompt_metric("Select the variable to visualize:")? {
            let series = self.store.series(&hotkey, metric);
            let label = self.names.sort_name(&hotkey).to_string();
            self.renderer.render_single(&series, &label)?;
        }
        Ok(())
    }

    /// Build an exclusion set interactively, then draw one overlay chart of
    /// the chosen metric across all remaining hotkeys.
    fn compare_mode(&mut self) -> Result<()> {
        let exclude = self.collect_exclusions()?;
        let metric =
            match self.prompt_metric("Select the variable for comparison across all hotkeys:")? {
                Some(metric) => metric,
                None => return Ok(()),
            };
        self.renderer
            .render_overlay(self.store, metric, self.names, &exclude)?;
        Ok(())
    }

    fn collect_exclusions(&mut self) -> Result<HashSet<String>> {
        let hotkeys = self.store.distinct_hotkeys();
        let mut exclude = HashSet::new();
        loop {
            self.console.line("")?;
            self.console.line("Do you want to exclude a hotkey? (yes/no)")?;
            let answer = match self.console.prompt("Enter your choice: ")? {
                Some(answer) => answer,
                None => break,
            };
            if !answer.eq_ignore_ascii_case("yes") {
                break;
            }
            self.console.line("Select a hotkey to exclude:")?;
            if let Selection::Hotkey(hotkey) = select_hotkey(&mut self.console, &hotkeys, self.names)? {
                // set semantics: picking the same hotkey twice is a no-op
                exclude.insert(hotkey);
            }
            self.console
                .line("Would you like to exclude another hotkey? (yes/no)")?;
            let again = match self.console.prompt("Enter your choice: ")? {
                Some(answer) => answer,
                None => break,
            };
            if !again.eq_ignore_ascii_case("yes") {
                break;
            }
        }
        Ok(exclude)
    }

    /// Five-metric menu with an inline retry on bad input; the last entry
    /// backs out without choosing. Returns None on back-out or EOF.
    fn prompt_metric(&mut self, header: &str) -> Result<Option<Metric>> {
        loop {
            self.console.line("")?;
            self.console.line(header)?;
            for (idx, metric) in Metric::ALL.iter().enumerate() {
                self.console.line(&format!("{}. {}", idx + 1, metric.label()))?;
            }
            self.console
                .line(&format!("{}. Return to previous menu", Metric::ALL.len() + 1))?;
            let choice = match self.console.prompt("Enter your choice: ")? {
                Some(line) => line,
                None => return Ok(None),
            };
            match choice.parse::<usize>() {
                Ok(n) if (1..=Metric::ALL.len()).contains(&n) => {
                    return Ok(Some(Metric::ALL[n - 1]))
                }
                Ok(n) if n == Metric::ALL.len() + 1 => return Ok(None),
                _ => self.console.line("Invalid choice. Please try again.")?,
            }
        }
    }
}

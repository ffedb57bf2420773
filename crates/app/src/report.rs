use std::io::{self, Write};

use crate::seeder::{CityOutcome, ProgressSink, SeedEvent, SeedMode, SeedSummary};

/// Writes a human-readable seed report, one line per event.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_summary(&mut self, summary: &SeedSummary) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Summary")?;
        match summary.mode {
            SeedMode::DryRun => writeln!(self.out, "  would add: {}", summary.would_add)?,
            SeedMode::Apply => writeln!(self.out, "  added:     {}", summary.added)?,
        }
        writeln!(self.out, "  skipped:   {}", summary.skipped)?;
        if summary.missing_provinces > 0 {
            writeln!(
                self.out,
                "  provinces not found: {}",
                summary.missing_provinces
            )?;
        }

        writeln!(self.out)?;
        match summary.mode {
            SeedMode::DryRun => {
                writeln!(self.out, "Dry run complete. Re-run without --dry-run to apply.")?
            }
            SeedMode::Apply => {
                writeln!(self.out, "Done. Next step: run place discovery for the new cities.")?
            }
        }
        Ok(())
    }
}

impl<W: Write> ProgressSink for ConsoleReporter<W> {
    fn on_event(&mut self, event: &SeedEvent) -> io::Result<()> {
        match event {
            SeedEvent::Started { country_slug, mode } => {
                writeln!(self.out, "Seeding cities for '{country_slug}'")?;
                if mode.is_dry_run() {
                    writeln!(self.out, "DRY RUN: no rows will be written")?;
                }
            }
            SeedEvent::ProvinceStarted { slug, name, cities } => {
                writeln!(self.out)?;
                writeln!(self.out, "{name} ({slug}, {cities} cities)")?;
            }
            SeedEvent::ProvinceMissing { slug } => {
                writeln!(self.out)?;
                writeln!(self.out, "! province '{slug}' not found, skipping")?;
            }
            SeedEvent::City(record) => {
                let (symbol, status) = match record.outcome {
                    CityOutcome::Added => ('+', "added"),
                    CityOutcome::Skipped => ('=', "already exists"),
                    CityOutcome::WouldAdd => ('~', "would add"),
                };
                writeln!(
                    self.out,
                    "  {symbol} {} [{}] {status}",
                    record.name, record.slug
                )?;
            }
            SeedEvent::Finished(summary) => self.write_summary(summary)?,
        }
        self.out.flush()
    }
}

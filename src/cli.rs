use anyhow::{anyhow, bail, Context as _, Result};
use console::{style, StyledObject};
use std::path::{Path, PathBuf};

use crate::args::{Args, Command, TableArg};
use crate::config::Config;
use crate::document::{build_documents, Batch, SourceRow};
use crate::error::RowError;
use crate::export::{self, ExportOutcome, ExportStatus};
use crate::formats::{BillitRow, ErelonenRow, Format, Period, RappelsRow};
use crate::reference::{ReferenceKind, ReferenceStore};
use crate::resolve::{self, AnswerFile, Prompter, RelationTarget, Resolution};
use crate::sheet::read_table;
use crate::terminal::{self, BulletPointPrinter, TerminalPrompter};

pub fn main(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    match args.command {
        Command::Billit { input } => convert(config, Format::Billit, &input, None, args.answers),
        Command::Erelonen {
            input,
            year,
            month,
        } => {
            let period = match (year, month) {
                (Some(year), Some(month)) => Some(Period { year, month }),
                _ => None,
            };
            convert(config, Format::Erelonen, &input, period, args.answers)
        }
        Command::Rappels { input } => convert(config, Format::Rappels, &input, None, args.answers),
        Command::ListReference { table, name, code } => {
            list_reference(&config, &table, name.as_deref(), code.as_deref())
        }
        Command::EditReference { table } => edit_reference(&config, &table),
        Command::CleanReference { table } => clean_reference(&config, &table),
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(&args.config)?;
    if let Some(folder) = &args.output_folder {
        config.output_folder = folder.clone();
    }
    if let Some(path) = &args.relation_codes {
        config.relation_codes_file = path.clone();
    }
    if let Some(path) = &args.ledger_accounts {
        config.ledger_accounts_file = path.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn convert(
    config: Config,
    format: Format,
    input: &Path,
    period: Option<Period>,
    answers: Option<PathBuf>,
) -> Result<()> {
    let mut cli = Cli::open(config)?;
    let stamp = chrono::Local::now().format("%H_%M").to_string();
    let summary = match answers {
        Some(path) => {
            let mut prompter = AnswerFile::load(&path)?;
            cli.convert(format, input, period, &mut prompter, &stamp)?
        }
        None => cli.convert(format, input, period, &mut TerminalPrompter, &stamp)?,
    };
    print_summary(&BulletPointPrinter::new(), &summary);
    Ok(())
}

/// Everything a conversion run produced.
#[derive(Debug)]
pub struct ConversionSummary {
    pub format: Format,
    pub output_folder: PathBuf,
    pub records: usize,
    pub row_errors: Vec<RowError>,
    pub relation_codes: Resolution,
    pub ledger_accounts: Resolution,
    pub missing_order_numbers: Vec<String>,
    pub notes: Vec<String>,
    /// None if no record could be built
    pub export: Option<ExportOutcome>,
}

/// A converter with both reference tables loaded and validated.
pub struct Cli {
    config: Config,
    relation_codes: ReferenceStore,
    ledger_accounts: ReferenceStore,
}

impl Cli {
    pub fn open(config: Config) -> Result<Self> {
        let relation_codes = open_store(&config, ReferenceKind::RelationCodes)?;
        let ledger_accounts = open_store(&config, ReferenceKind::LedgerAccounts)?;
        Ok(Self {
            config,
            relation_codes,
            ledger_accounts,
        })
    }

    /// Converts one input file into `<output_folder>/<stamp>/`.
    pub fn convert(
        &mut self,
        format: Format,
        input: &Path,
        period: Option<Period>,
        prompter: &mut dyn Prompter,
        stamp: &str,
    ) -> Result<ConversionSummary> {
        log::info!("Converting {} file {}", format, input.display());
        let output_folder = self.config.output_folder.join(stamp);
        std::fs::create_dir_all(&output_folder)
            .with_context(|| anyhow!("Failed to create {}", output_folder.display()))?;

        let header_row = match format {
            Format::Erelonen => self.config.erelonen_header_rows,
            Format::Billit | Format::Rappels => 0,
        };
        let table = read_table(input, header_row)?;

        let mut missing_order_numbers = vec![];
        let (batch, relation_codes, ledger_accounts) = match format {
            Format::Billit => {
                let billit = BillitRow::from_table(&table)?;
                missing_order_numbers = billit.missing_order_numbers;
                export::write_missing_order_numbers(&output_folder, &missing_order_numbers)?;
                self.process(format, billit.rows, prompter)?
            }
            Format::Erelonen => {
                let rows = ErelonenRow::from_table(table, period)?;
                self.process(format, rows, prompter)?
            }
            Format::Rappels => {
                let rows = RappelsRow::from_table(&table)?;
                self.process(format, rows, prompter)?
            }
        };

        let notes = export::review_notes(&batch.documents, &batch.invoice_numbers);
        let export = if batch.documents.is_empty() {
            log::warn!("No records created for {} conversion, nothing exported", format);
            None
        } else {
            Some(export::export(
                &batch.documents,
                &output_folder,
                stamp,
                &format.file_suffix(&batch.invoice_numbers),
                &notes,
            )?)
        };

        Ok(ConversionSummary {
            format,
            output_folder,
            records: batch.documents.len(),
            row_errors: batch.row_errors,
            relation_codes,
            ledger_accounts,
            missing_order_numbers,
            notes,
            export,
        })
    }

    fn process<R: SourceRow + RelationTarget>(
        &mut self,
        format: Format,
        mut rows: Vec<R>,
        prompter: &mut dyn Prompter,
    ) -> Result<(Batch, Resolution, Resolution)> {
        let relation_codes =
            resolve::resolve_relation_codes(&mut rows, &mut self.relation_codes, prompter)?;
        let mut batch = build_documents(&rows, &self.config.build_rules(format));
        let ledger_accounts = resolve::resolve_ledger_accounts(
            &mut batch.documents,
            &mut self.ledger_accounts,
            prompter,
        )?;
        format.sort(&mut batch.documents);
        Ok((batch, relation_codes, ledger_accounts))
    }
}

fn reference_kind(table: &TableArg) -> ReferenceKind {
    if table.ledger {
        ReferenceKind::LedgerAccounts
    } else {
        ReferenceKind::RelationCodes
    }
}

fn reference_path(config: &Config, kind: ReferenceKind) -> &Path {
    match kind {
        ReferenceKind::RelationCodes => &config.relation_codes_file,
        ReferenceKind::LedgerAccounts => &config.ledger_accounts_file,
    }
}

/// Opens a reference table and refuses to continue if it maps a name to several codes.
fn open_store(config: &Config, kind: ReferenceKind) -> Result<ReferenceStore> {
    let store = ReferenceStore::open(reference_path(config, kind), kind)?;
    store.validate()?;
    log::info!(
        "Reference file {} is valid ({} entries)",
        store.path().display(),
        store.len()
    );
    Ok(store)
}

fn list_reference(
    config: &Config,
    table: &TableArg,
    name: Option<&str>,
    code: Option<&str>,
) -> Result<()> {
    let kind = reference_kind(table);
    let store = ReferenceStore::open(reference_path(config, kind), kind)?;
    println!(
        "{}",
        style_header(&format!("{} ({}):", kind.value_header(), store.path().display()))
    );
    let entries = store.search(name, code).map(|entry| {
        format!(
            "{} {} {}",
            style_name(&entry.name),
            style("=>").dim(),
            style_code(&entry.code)
        )
    });
    BulletPointPrinter::new().print_list(
        format!("{} of {} entries", store.search(name, code).count(), store.len()),
        entries,
        style("(none)").italic(),
    );
    Ok(())
}

fn edit_reference(config: &Config, table: &TableArg) -> Result<()> {
    let kind = reference_kind(table);
    let mut store = ReferenceStore::open(reference_path(config, kind), kind)?;
    let Some(edited) = terminal::edit_text(&store.to_text()?)? else {
        bail!("You did not save the edits, please try again");
    };
    store
        .replace_from_text(&edited)
        .context("Edited table is not valid, nothing was saved")?;
    let question = format!("Save {} entries to {}?", store.len(), store.path().display());
    if terminal::prompt_yes_no(&question)? {
        store.save()?;
        println!("{}", style("Saved").green());
    } else {
        println!("{}", style("Discarded the edits").yellow());
    }
    Ok(())
}

fn clean_reference(config: &Config, table: &TableArg) -> Result<()> {
    let kind = reference_kind(table);
    let mut store = ReferenceStore::open(reference_path(config, kind), kind)?;
    let removed = store.remove_duplicates();
    if removed > 0 {
        store.save()?;
    }
    println!(
        "Removed {} duplicate rows from {}, {} entries left",
        style(removed).bold(),
        store.path().display(),
        store.len()
    );
    Ok(())
}

fn print_summary(printer: &BulletPointPrinter, summary: &ConversionSummary) {
    println!();
    println!(
        "{}",
        style_header(&format!("{} conversion:", summary.format))
    );
    printer.print_item(format!(
        "{} records, output folder {}",
        style(summary.records).bold(),
        summary.output_folder.display()
    ));
    match &summary.export {
        Some(outcome) => {
            printer.print_item(format!("Written to {}", style_path(&outcome.path)));
            if let ExportStatus::Incomplete { missing } = &outcome.status {
                printer.print_list(
                    style(format!("{} empty required cells", missing.len())).red(),
                    missing,
                    "",
                );
            }
        }
        None => printer.print_item(style("Nothing exported").red()),
    }
    print_resolution(printer, "Relation codes", &summary.relation_codes);
    print_resolution(printer, "Ledger accounts", &summary.ledger_accounts);
    if !summary.row_errors.is_empty() {
        printer.print_list(
            style("Skipped rows").yellow(),
            &summary.row_errors,
            "",
        );
    }
    if !summary.missing_order_numbers.is_empty() {
        printer.print_list(
            style("Missing Order nummer").yellow(),
            &summary.missing_order_numbers,
            "",
        );
    }
    printer.print_list("Checks", &summary.notes, style("All OK").green());
}

fn print_resolution(printer: &BulletPointPrinter, title: &str, resolution: &Resolution) {
    printer.print_item(format!(
        "{title}: {} from reference, {} entered",
        resolution.from_reference,
        resolution.answered.len()
    ));
    if !resolution.unresolved.is_empty() {
        printer.indent().print_list(
            style("Still missing").red(),
            &resolution.unresolved,
            "",
        );
    }
}

fn style_header(header: &str) -> StyledObject<&str> {
    style(header).bold().underlined()
}

fn style_name(name: &str) -> StyledObject<&str> {
    style(name).cyan()
}

fn style_code(code: &str) -> StyledObject<&str> {
    style(code).magenta().bold()
}

fn style_path(path: &Path) -> StyledObject<String> {
    style(path.display().to_string()).green()
}

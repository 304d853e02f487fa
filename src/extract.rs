use crate::models::{Basis, BasisReport, ExpenseRow, Metrics, Section};
use serde_json::Value;
use tracing::warn;

const GROSS_PROFIT: &str = "gross profit";
const OPERATING_PROFIT: &str = "operating profit";
const NET_PROFIT: &str = "net profit";
const OPERATING_INCOME: &str = "operating income";
const COST_OF_GOODS: &str = "cost of goods";
const SALES_ACCOUNT: &str = "sales";
const COGS_ACCOUNT: &str = "cost of goods sold";
const OPERATING_EXPENSE: &str = "operating expense";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub metrics: Metrics,
    pub expenses: Vec<ExpenseRow>,
    pub warning: Option<String>,
}

/// Pulls the six summary metrics and the operating expense breakdown out of a
/// P&L section list.
///
/// Single left-to-right pass; a later matching section overwrites an earlier
/// one. Fields are decoded only on the branch that reads them, so a bad
/// `total` on a section nobody matches is never looked at. A field that is
/// read and cannot be decoded stops the pass: whatever metrics were set up to
/// that point are kept and the expense rows are dropped.
pub fn extract_metrics(sections: &[Value]) -> Extraction {
    let mut metrics = Metrics::default();
    match walk(sections, &mut metrics) {
        Ok(expenses) => Extraction {
            metrics,
            expenses,
            warning: None,
        },
        Err(err) => {
            warn!("failed to process P&L sections: {err}");
            Extraction {
                metrics,
                expenses: Vec::new(),
                warning: Some(format!("Error processing data: {err}")),
            }
        }
    }
}

pub fn extract_basis(basis: Basis, sections: &[Value]) -> BasisReport {
    let extraction = extract_metrics(sections);
    BasisReport {
        basis,
        metrics: extraction.metrics,
        expenses: extraction.expenses,
        has_data: !sections.is_empty(),
        warnings: extraction.warning.into_iter().collect(),
    }
}

fn walk(sections: &[Value], metrics: &mut Metrics) -> Result<Vec<ExpenseRow>, serde_json::Error> {
    let mut expenses = Vec::new();

    for raw in sections {
        let section = Section::from_value(raw)?;
        let name = section.match_key()?;

        if name.contains(GROSS_PROFIT) {
            metrics.gross_profit = section.total()?;
            for raw_sub in section.children()? {
                let sub = Section::from_value(raw_sub)?;
                let sub_name = sub.match_key()?;
                if sub_name.contains(OPERATING_INCOME) {
                    assign_exact(sub, SALES_ACCOUNT, &mut metrics.sales)?;
                } else if sub_name.contains(COST_OF_GOODS) {
                    assign_exact(sub, COGS_ACCOUNT, &mut metrics.cogs)?;
                }
            }
        } else if name.contains(OPERATING_PROFIT) {
            metrics.operating_profit = section.total()?;
            for raw_sub in section.children()? {
                let sub = Section::from_value(raw_sub)?;
                if sub.match_key()? == OPERATING_EXPENSE {
                    expenses = sub
                        .children()?
                        .iter()
                        .map(|raw_item| Section::from_value(raw_item).and_then(ExpenseRow::try_from))
                        .collect::<Result<_, _>>()?;
                    metrics.operating_expenses = sub.total()?;
                }
            }
        } else if name.contains(NET_PROFIT) {
            metrics.net_profit = section.total()?;
        }
    }

    Ok(expenses)
}

/// Sets `target` from every child of `parent` whose name equals `account`.
/// Totals of the other children are never read.
fn assign_exact(parent: Section<'_>, account: &str, target: &mut f64) -> Result<(), serde_json::Error> {
    for raw_item in parent.children()? {
        let item = Section::from_value(raw_item)?;
        if item.match_key()? == account {
            *target = item.total()?;
        }
    }
    Ok(())
}

//! Parse context and the fold that updates it line by line.

use rust_decimal::Decimal;

use crate::format::{CompiledFormat, DetailField, FragmentPlacement};
use crate::models::record::RawLine;

use super::extractor::Fields;

/// State carried from line to line within one document.
///
/// Owned by a single parse session and never shared between documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
    /// Active style code or barcode.
    pub current_style_code: Option<String>,
    /// Active product name.
    pub current_style_name: Option<String>,
    pub current_color: Option<String>,
    /// Name pieces waiting for the next data row, oldest first.
    pub pending_name_fragments: Vec<RawLine>,
    /// Size labels of the current column layout.
    pub size_headers: Vec<String>,
    /// Secondary reference from a single size marker.
    pub current_reference: Option<String>,
    /// Size from the last single size marker.
    pub current_size: Option<String>,
    /// Price printed on the style marker.
    pub current_unit_price: Option<Decimal>,
    /// Style total printed by the supplier, for reconciliation.
    pub declared_total: Option<Decimal>,
    pub quality: Option<String>,
    pub retail_price: Option<Decimal>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything that belongs to the previous style.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Join and clear the pending fragments.
    fn take_fragments(&mut self) -> Option<String> {
        if self.pending_name_fragments.is_empty() {
            return None;
        }
        let joined = self
            .pending_name_fragments
            .drain(..)
            .map(|line| line.text)
            .collect::<Vec<_>>()
            .join(" ");
        Some(joined)
    }
}

/// Effect of folding one line into the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fold {
    /// Context updated.
    Applied,
    /// Fragment buffered for a later data row.
    Pending,
    /// Fragments merged into the product name.
    Flushed(String),
    /// Fragments dropped by the window bound or a style boundary.
    Discarded(Vec<RawLine>),
    /// Free text in a format that has no multi-line names.
    Unrecognized(RawLine),
}

/// Applies extracted fields to a [`ParseContext`].
#[derive(Debug, Clone, Copy)]
pub struct Accumulator {
    max_fragments: usize,
    placement: FragmentPlacement,
}

impl Accumulator {
    pub fn new(format: &CompiledFormat) -> Self {
        let spec = format.spec();
        Self {
            max_fragments: spec.max_fragments,
            placement: spec.fragment_placement,
        }
    }

    /// Fold one line's fields into the context.
    pub fn fold(&self, fields: &Fields, line: &RawLine, ctx: &mut ParseContext) -> Fold {
        match fields {
            Fields::Nothing => Fold::Applied,

            Fields::Fragment(_) => {
                if self.max_fragments == 0 {
                    return Fold::Unrecognized(line.clone());
                }
                ctx.pending_name_fragments.push(line.clone());
                if ctx.pending_name_fragments.len() > self.max_fragments {
                    let oldest = ctx.pending_name_fragments.remove(0);
                    return Fold::Discarded(vec![oldest]);
                }
                Fold::Pending
            }

            Fields::Style(style) => {
                let stale = std::mem::take(&mut ctx.pending_name_fragments);
                let (leading, discarded) = match self.placement {
                    FragmentPlacement::Leading if !stale.is_empty() => {
                        let text: Vec<String> = stale.into_iter().map(|l| l.text).collect();
                        (Some(text.join(" ")), Vec::new())
                    }
                    _ => (None, stale),
                };

                ctx.reset();
                ctx.current_style_code = Some(style.code.clone());
                ctx.current_style_name = match (leading, style.name.clone()) {
                    (Some(lead), Some(name)) => Some(format!("{} {}", lead, name)),
                    (lead, name) => name.or(lead),
                };
                ctx.current_unit_price = style.unit_price;

                if discarded.is_empty() {
                    Fold::Applied
                } else {
                    Fold::Discarded(discarded)
                }
            }

            Fields::Color(color) => {
                ctx.current_color = Some(color.clone());
                Fold::Applied
            }

            Fields::Sizes {
                sizes,
                reference,
                layout,
            } => {
                if *layout {
                    ctx.size_headers = sizes.clone();
                } else {
                    ctx.current_size = sizes.first().cloned();
                    if reference.is_some() {
                        ctx.current_reference = reference.clone();
                    }
                }
                Fold::Applied
            }

            Fields::Detail {
                field,
                value,
                amount,
            } => {
                match field {
                    DetailField::Name => {
                        ctx.current_style_name = Some(value.clone());
                        if amount.is_some() {
                            ctx.declared_total = *amount;
                        }
                    }
                    DetailField::Quality => ctx.quality = Some(value.clone()),
                    DetailField::RetailPrice => ctx.retail_price = *amount,
                }
                Fold::Applied
            }

            Fields::Rows(_) => match ctx.take_fragments() {
                Some(joined) => {
                    ctx.current_style_name = Some(match ctx.current_style_name.take() {
                        Some(name) => format!("{} {}", name, joined),
                        None => joined.clone(),
                    });
                    Fold::Flushed(joined)
                }
                None => Fold::Applied,
            },
        }
    }
}

mod editor;
mod notifier;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::WidgetConfig;
use crate::constraint::{AuxValue, TypeConstraint};
use crate::error::{EngineError, Result};
use crate::options::EngineOptions;
use crate::resolver::{FieldResolver, parse_weight};
use crate::schema::SchemaIndex;

pub use editor::{EditorState, WidgetEditor};
pub use notifier::{NoticeTicket, TransientNotifier};

/// Staged draft of one widget's configuration.
///
/// Mutations only touch the draft. A rejected operator input leaves the
/// draft as it was and is shown through the session's notifier.
#[derive(Debug, Clone)]
pub struct EditSession {
    draft: WidgetConfig,
    schema: Arc<SchemaIndex>,
    constraint: Arc<TypeConstraint>,
    notifier: TransientNotifier,
    default_weight: u32,
}

impl EditSession {
    pub(crate) fn open(
        baseline: &WidgetConfig,
        schema: Arc<SchemaIndex>,
        constraint: Arc<TypeConstraint>,
        options: EngineOptions,
    ) -> Self {
        Self {
            draft: baseline.clone(),
            schema,
            constraint,
            notifier: TransientNotifier::new(options.notice_ttl),
            default_weight: options.default_weight,
        }
    }

    pub(crate) fn into_draft(self) -> WidgetConfig {
        self.draft
    }

    pub fn draft(&self) -> &WidgetConfig {
        &self.draft
    }

    pub fn constraint(&self) -> &TypeConstraint {
        &self.constraint
    }

    pub fn notifier(&self) -> &TransientNotifier {
        &self.notifier
    }

    /// Current validation message, `""` when none.
    pub fn notice(&self) -> &str {
        self.notifier.message()
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.notifier.tick(now)
    }

    /// Ticket of the visible notice; pass it to [`expire_notice`](Self::expire_notice)
    /// from a deferred timer.
    pub fn notice_ticket(&self) -> Option<NoticeTicket> {
        self.notifier.ticket()
    }

    pub fn expire_notice(&mut self, ticket: NoticeTicket) -> bool {
        self.notifier.expire(ticket)
    }

    pub fn resolver(&self) -> FieldResolver<'_> {
        FieldResolver::new(&self.schema, &self.constraint)
    }

    /// Every field the widget may use as a root.
    pub fn eligible_fields(&self) -> Vec<String> {
        self.schema
            .fields(&self.constraint.accepted_types, self.constraint.eligibility)
    }

    /// Choices for the row at `index`: its own field plus unselected ones.
    pub fn available_fields_for_row(&self, index: usize) -> Result<Vec<String>> {
        let selected = self.row(index)?;
        Ok(self
            .eligible_fields()
            .into_iter()
            .filter(|field| field == selected || !self.draft.root_fields.contains(field))
            .collect())
    }

    pub fn can_add_row(&self) -> bool {
        self.constraint.multiple && self.next_unselected_field().is_some()
    }

    /// Replace the sole root of a single-root widget. Multi-root widgets
    /// replace their first row.
    pub fn select_root_field(&mut self, field: &str) -> Result<()> {
        if self.constraint.multiple {
            return self.select_root_field_at(0, field);
        }
        if !self.is_eligible(field) {
            return Err(self.reject_field(field));
        }
        debug!(widget_id = %self.draft.widget_id, field, "root field selected");
        self.draft.root_fields = vec![field.to_string()];
        Ok(())
    }

    /// Replace the root at `index`. Re-selecting the current field is a no-op.
    pub fn select_root_field_at(&mut self, index: usize, field: &str) -> Result<()> {
        let current = self.row(index)?;
        if current == field {
            return Ok(());
        }
        let taken = self.draft.root_fields.iter().any(|root| root == field);
        if taken || !self.is_eligible(field) {
            return Err(self.reject_field(field));
        }
        debug!(widget_id = %self.draft.widget_id, index, field, "root field replaced");
        self.draft.root_fields[index] = field.to_string();
        Ok(())
    }

    /// Append the first eligible field not selected yet. Returns the added
    /// field, or `None` when nothing is left to add.
    pub fn add_root_field_row(&mut self) -> Option<String> {
        if !self.constraint.multiple {
            return None;
        }
        let field = self.next_unselected_field()?;
        if self.constraint.weighted {
            let weight = self.default_weight;
            self.weights_mut().push(weight);
        }
        self.draft.root_fields.push(field.clone());
        debug!(widget_id = %self.draft.widget_id, field = %field, "root field row added");
        Some(field)
    }

    /// Remove the row at `index` and its weight. Removing the last remaining
    /// row is refused without error; returns whether a row was removed.
    pub fn remove_root_field_row(&mut self, index: usize) -> Result<bool> {
        self.row(index)?;
        if self.draft.root_fields.len() == 1 {
            return Ok(false);
        }
        let removed = self.draft.root_fields.remove(index);
        if let Some(weights) = self.draft.field_weights.as_mut()
            && index < weights.len()
        {
            weights.remove(index);
        }
        debug!(widget_id = %self.draft.widget_id, index, field = %removed, "root field row removed");
        Ok(true)
    }

    pub fn set_weight(&mut self, index: usize, raw: &str) -> Result<u32> {
        if !self.constraint.weighted {
            return Err(self.contract_violation(EngineError::UnknownProperty {
                name: "fieldWeights".to_string(),
                kind: self.constraint.kind.clone(),
            }));
        }
        self.row(index)?;
        let weight = match parse_weight(raw) {
            Ok(weight) => weight,
            Err(err) => return Err(self.notify(err)),
        };
        self.weights_mut()[index] = weight;
        debug!(widget_id = %self.draft.widget_id, index, weight, "weight updated");
        Ok(weight)
    }

    pub fn set_aux_value(&mut self, name: &str, value: impl Into<AuxValue>) -> Result<()> {
        let coerced = match self.constraint.aux_property(name) {
            Ok(property) => property.coerce(name, value.into()),
            Err(err) => return Err(self.contract_violation(err)),
        };
        let value = match coerced {
            Ok(value) => value,
            Err(err) => return Err(self.notify(err)),
        };
        debug!(widget_id = %self.draft.widget_id, name, value = %value, "aux value updated");
        self.draft.aux_values.insert(name.to_string(), value);
        Ok(())
    }

    /// Drop an explicit aux value so the declared default applies again.
    pub fn reset_aux_value(&mut self, name: &str) -> Result<()> {
        if let Err(err) = self.constraint.aux_property(name) {
            return Err(self.contract_violation(err));
        }
        self.draft.aux_values.shift_remove(name);
        Ok(())
    }

    fn row(&self, index: usize) -> Result<&String> {
        let len = self.draft.root_fields.len();
        match self.draft.root_fields.get(index) {
            Some(field) => Ok(field),
            None => {
                let err = EngineError::IndexOutOfRange { index, len };
                warn!(widget_id = %self.draft.widget_id, %err, "contract violation");
                Err(err)
            }
        }
    }

    fn is_eligible(&self, field: &str) -> bool {
        self.schema.is_eligible(
            field,
            &self.constraint.accepted_types,
            self.constraint.eligibility,
        )
    }

    fn next_unselected_field(&self) -> Option<String> {
        self.eligible_fields()
            .into_iter()
            .find(|field| !self.draft.root_fields.contains(field))
    }

    /// Weights vector for a weighted kind, padded to one weight per root.
    fn weights_mut(&mut self) -> &mut Vec<u32> {
        let roots = self.draft.root_fields.len();
        let default_weight = self.default_weight;
        let weights = self.draft.field_weights.get_or_insert_with(Vec::new);
        if weights.len() < roots {
            weights.resize(roots, default_weight);
        }
        weights
    }

    fn reject_field(&mut self, field: &str) -> EngineError {
        self.notify(EngineError::IneligibleField {
            field: field.to_string(),
        })
    }

    fn notify(&mut self, err: EngineError) -> EngineError {
        debug!(widget_id = %self.draft.widget_id, %err, "edit rejected");
        self.notifier.report(err.to_string());
        err
    }

    fn contract_violation(&self, err: EngineError) -> EngineError {
        warn!(widget_id = %self.draft.widget_id, %err, "contract violation");
        err
    }
}

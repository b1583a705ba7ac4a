use super::error::ZatcaError;
use super::types::{PLACEHOLDER_PIH, ZatcaInvoice};

/// Per-seller invoice chain: the ICV counter and the hash of the last
/// reported invoice (PIH).
///
/// ZATCA requires the counter to increase by one for every invoice a
/// device issues and each invoice to carry the hash of its predecessor.
/// The chain hands out both values and must be told the hash of every
/// invoice it stamped before the next one can be stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceChain {
    next_counter: u64,
    previous_hash: String,
    pending: bool,
}

impl Default for InvoiceChain {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceChain {
    /// Start a fresh chain at ICV 1 with the first-invoice PIH.
    pub fn new() -> Self {
        Self {
            next_counter: 1,
            previous_hash: PLACEHOLDER_PIH.to_string(),
            pending: false,
        }
    }

    /// Resume a chain from persisted state.
    pub fn resume(next_counter: u64, previous_hash: impl Into<String>) -> Result<Self, ZatcaError> {
        if next_counter == 0 {
            return Err(ZatcaError::Chain("invoice counter must start at 1".into()));
        }
        let previous_hash = previous_hash.into();
        if previous_hash.trim().is_empty() {
            return Err(ZatcaError::MissingField("previous invoice hash".into()));
        }
        Ok(Self {
            next_counter,
            previous_hash,
            pending: false,
        })
    }

    /// The ICV the next stamped invoice will receive.
    pub fn next_counter(&self) -> u64 {
        self.next_counter
    }

    /// The PIH the next stamped invoice will receive.
    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// Write the next ICV and PIH into `invoice`.
    ///
    /// Fails if the previously stamped invoice has not been recorded yet,
    /// since its hash is needed as the next PIH.
    pub fn stamp(&mut self, invoice: &mut ZatcaInvoice) -> Result<(), ZatcaError> {
        if self.pending {
            return Err(ZatcaError::Chain(format!(
                "hash of invoice with ICV {} has not been recorded",
                self.next_counter - 1
            )));
        }
        let following = self
            .next_counter
            .checked_add(1)
            .ok_or_else(|| ZatcaError::Chain("invoice counter exhausted".into()))?;
        invoice.invoice_counter_value = Some(self.next_counter);
        invoice.previous_invoice_hash = Some(self.previous_hash.clone());
        self.next_counter = following;
        self.pending = true;
        Ok(())
    }

    /// Record the hash of the invoice stamped last.
    pub fn record(&mut self, invoice_hash: impl Into<String>) -> Result<(), ZatcaError> {
        let invoice_hash = invoice_hash.into();
        if invoice_hash.trim().is_empty() {
            return Err(ZatcaError::MissingField("invoice hash".into()));
        }
        self.previous_hash = invoice_hash;
        self.pending = false;
        Ok(())
    }
}

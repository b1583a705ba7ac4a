use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ZatcaError;
use super::format::round_amount;
use super::types::*;

/// Builder for [`ZatcaInvoice`] that derives the document totals from
/// its lines.
///
/// ```
/// use zatca::core::*;
/// use rust_decimal_macros::dec;
///
/// let invoice = ZatcaInvoiceBuilder::new("INV-001", "2024-06-15T10:30:00Z", InvoiceKind::Standard)
///     .seller("Test Company LLC", "310123456789003",
///         AddressBuilder::new("King Fahd Road", "1234", "Riyadh", "12345", "SA")
///             .district("Al Olaya")
///             .build())
///     .buyer("Buyer Trading Co")
///     .add_line(LineItemBuilder::new("Consulting", dec!(10), dec!(100)).build())
///     .build()
///     .unwrap();
///
/// assert_eq!(invoice.total, dec!(1150.00));
/// ```
pub struct ZatcaInvoiceBuilder {
    invoice_number: String,
    issue_date: String,
    due_date: Option<String>,
    invoice_type: InvoiceKind,
    seller: Option<(String, String, Address)>,
    seller_registration_number: Option<String>,
    buyer_name: String,
    buyer_vat_number: Option<String>,
    buyer_address: Option<Address>,
    payment_means: Option<PaymentMeans>,
    supply_date: Option<String>,
    items: Vec<LineItem>,
    invoice_counter_value: Option<u64>,
    previous_invoice_hash: Option<String>,
}

impl ZatcaInvoiceBuilder {
    pub fn new(
        invoice_number: impl Into<String>,
        issue_date: impl Into<String>,
        invoice_type: InvoiceKind,
    ) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            issue_date: issue_date.into(),
            due_date: None,
            invoice_type,
            seller: None,
            seller_registration_number: None,
            buyer_name: String::new(),
            buyer_vat_number: None,
            buyer_address: None,
            payment_means: None,
            supply_date: None,
            items: Vec::new(),
            invoice_counter_value: None,
            previous_invoice_hash: None,
        }
    }

    pub fn due_date(mut self, date: impl Into<String>) -> Self {
        self.due_date = Some(date.into());
        self
    }

    pub fn seller(
        mut self,
        name: impl Into<String>,
        vat_number: impl Into<String>,
        address: Address,
    ) -> Self {
        self.seller = Some((name.into(), vat_number.into(), address));
        self
    }

    pub fn seller_registration_number(mut self, crn: impl Into<String>) -> Self {
        self.seller_registration_number = Some(crn.into());
        self
    }

    pub fn buyer(mut self, name: impl Into<String>) -> Self {
        self.buyer_name = name.into();
        self
    }

    pub fn buyer_vat_number(mut self, vat_number: impl Into<String>) -> Self {
        self.buyer_vat_number = Some(vat_number.into());
        self
    }

    pub fn buyer_address(mut self, address: Address) -> Self {
        self.buyer_address = Some(address);
        self
    }

    pub fn payment_means(mut self, code: impl Into<String>, description: Option<String>) -> Self {
        self.payment_means = Some(PaymentMeans {
            code: code.into(),
            description,
        });
        self
    }

    pub fn supply_date(mut self, date: impl Into<String>) -> Self {
        self.supply_date = Some(date.into());
        self
    }

    pub fn add_line(mut self, line: LineItem) -> Self {
        self.items.push(line);
        self
    }

    pub fn invoice_counter_value(mut self, icv: u64) -> Self {
        self.invoice_counter_value = Some(icv);
        self
    }

    pub fn previous_invoice_hash(mut self, hash: impl Into<String>) -> Self {
        self.previous_invoice_hash = Some(hash.into());
        self
    }

    /// Build the invoice, summing line amounts into the document totals.
    pub fn build(self) -> Result<ZatcaInvoice, ZatcaError> {
        let (seller_name, seller_vat_number, seller_address) = self
            .seller
            .ok_or_else(|| ZatcaError::MissingField("seller".into()))?;

        if self.items.is_empty() {
            return Err(ZatcaError::MissingField(
                "at least one line item is required".into(),
            ));
        }
        if self.invoice_number.trim().is_empty() {
            return Err(ZatcaError::MissingField("invoice_number".into()));
        }

        let subtotal: Decimal = self.items.iter().map(|l| l.subtotal).sum();
        let vat_amount: Decimal = self.items.iter().map(|l| l.vat_amount).sum();

        Ok(ZatcaInvoice {
            invoice_number: self.invoice_number,
            issue_date: self.issue_date,
            due_date: self.due_date,
            invoice_type: self.invoice_type,
            seller_name,
            seller_vat_number,
            seller_registration_number: self.seller_registration_number,
            seller_address,
            buyer_name: self.buyer_name,
            buyer_vat_number: self.buyer_vat_number,
            buyer_address: self.buyer_address,
            payment_means: self.payment_means,
            supply_date: self.supply_date,
            items: self.items,
            subtotal,
            vat_amount,
            total: subtotal + vat_amount,
            invoice_counter_value: self.invoice_counter_value,
            previous_invoice_hash: self.previous_invoice_hash,
        })
    }
}

/// Builder for Address.
pub struct AddressBuilder {
    street: String,
    building_number: String,
    additional_number: Option<String>,
    city: String,
    postal_code: String,
    country_code: String,
    district: Option<String>,
}

impl AddressBuilder {
    pub fn new(
        street: impl Into<String>,
        building_number: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            building_number: building_number.into(),
            additional_number: None,
            city: city.into(),
            postal_code: postal_code.into(),
            country_code: country_code.into(),
            district: None,
        }
    }

    pub fn district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    pub fn additional_number(mut self, number: impl Into<String>) -> Self {
        self.additional_number = Some(number.into());
        self
    }

    pub fn build(self) -> Address {
        Address {
            street: self.street,
            building_number: self.building_number,
            additional_number: self.additional_number,
            city: self.city,
            postal_code: self.postal_code,
            country_code: self.country_code,
            district: self.district,
        }
    }
}

/// Builder for LineItem. Derives subtotal, VAT and total from quantity,
/// unit price and rate (default 15%).
pub struct LineItemBuilder {
    name: String,
    description: Option<String>,
    quantity: Decimal,
    unit_price: Decimal,
    vat_rate: Decimal,
}

impl LineItemBuilder {
    pub fn new(name: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            description: None,
            quantity,
            unit_price,
            vat_rate: dec!(15),
        }
    }

    pub fn vat_rate(mut self, rate: Decimal) -> Self {
        self.vat_rate = rate;
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn build(self) -> LineItem {
        let subtotal = round_amount(self.quantity * self.unit_price);
        let vat_amount = round_amount(subtotal * self.vat_rate / dec!(100));
        LineItem {
            name: self.name,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            vat_rate: self.vat_rate,
            vat_amount,
            subtotal,
            total: subtotal + vat_amount,
        }
    }
}

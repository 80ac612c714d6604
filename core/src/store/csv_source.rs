use crate::{
    error::{InsightError, InsightResult},
    transaction::{parse_purchase_date, Transaction},
};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::io::{Read, Write};

/// Column headers of the purchase log, in write order.
pub const CSV_HEADERS: [&str; 5] = [
    "Customer ID",
    "Product ID",
    "Product Category",
    "Purchase Amount",
    "Purchase Date",
];

struct Columns {
    customer: usize,
    product:  usize,
    category: usize,
    amount:   usize,
    date:     usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> InsightResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| InsightError::MalformedRecord {
                    line:   1,
                    reason: format!("missing required column '{name}'"),
                })
        };
        Ok(Self {
            customer: find(CSV_HEADERS[0])?,
            product:  find(CSV_HEADERS[1])?,
            category: find(CSV_HEADERS[2])?,
            amount:   find(CSV_HEADERS[3])?,
            date:     find(CSV_HEADERS[4])?,
        })
    }

    fn parse(&self, record: &StringRecord, line: u64) -> InsightResult<Transaction> {
        let field = |idx: usize, name: &str| {
            record.get(idx).ok_or_else(|| InsightError::MalformedRecord {
                line,
                reason: format!("missing value for '{name}'"),
            })
        };
        let raw_amount = field(self.amount, CSV_HEADERS[3])?;
        let amount: f64 = raw_amount
            .trim()
            .parse()
            .map_err(|_| InsightError::MalformedRecord {
                line,
                reason: format!("purchase amount '{raw_amount}' is not a number"),
            })?;
        let date = parse_purchase_date(field(self.date, CSV_HEADERS[4])?, line)?;

        Transaction::new(
            field(self.customer, CSV_HEADERS[0])?.trim(),
            field(self.product, CSV_HEADERS[1])?.trim(),
            field(self.category, CSV_HEADERS[2])?.trim(),
            amount,
            date,
            line,
        )
    }
}

pub(super) fn read<R: Read>(reader: R) -> InsightResult<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let columns = Columns::locate(rdr.headers()?)?;

    let mut out = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);
        out.push(columns.parse(&record, line)?);
    }
    Ok(out)
}

pub(super) fn read_path(path: &str) -> InsightResult<Vec<Transaction>> {
    let file = std::fs::File::open(path)?;
    read(std::io::BufReader::new(file))
}

/// Write records in the purchase-log layout, amounts to the cent.
pub fn write_csv<W: Write>(writer: W, transactions: &[Transaction]) -> InsightResult<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(CSV_HEADERS)?;
    for t in transactions {
        let amount = format!("{:.2}", t.amount);
        let date = t.purchase_date.format("%Y-%m-%d").to_string();
        wtr.write_record([
            t.customer_id.as_str(),
            t.product_id.as_str(),
            t.category.as_str(),
            amount.as_str(),
            date.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Column holding the order number
pub const ORDER_NO_COLUMN: &str = "order_no";

/// One order row, column name -> value (`null` for empty cells)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OrderRecord {
    fields: Map<String, Value>,
}

impl OrderRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).and_then(|v| v.as_str())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Read-only order table keyed by order number
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Vec<OrderRecord>,
}

impl OrderBook {
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let book = Self::from_csv_reader(file)?;
        info!("Loaded {} orders from {:?}", book.len(), path.as_ref());
        Ok(book)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if !headers.iter().any(|h| h == ORDER_NO_COLUMN) {
            return Err(Error::MissingColumn(ORDER_NO_COLUMN.to_string()));
        }

        let mut orders = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let value = match record.get(i) {
                        Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                        _ => Value::Null,
                    };
                    (column.to_string(), value)
                })
                .collect();
            orders.push(OrderRecord { fields });
        }

        Ok(Self { orders })
    }

    /// First order whose `order_no` equals `order_no` (surrounding whitespace ignored)
    pub fn find(&self, order_no: &str) -> Result<Option<&OrderRecord>> {
        let order_no = order_no.trim();
        if order_no.is_empty() {
            return Err(Error::InvalidInput("Order ID is required".to_string()));
        }
        Ok(self
            .orders
            .iter()
            .find(|order| order.get(ORDER_NO_COLUMN) == Some(order_no)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Placeholder returned when an entry has no usable image URL
pub const PLACEHOLDER_IMAGE: &str = "default_image.jpg";

static IMAGE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://.*\.(jpg|jpeg|png|webp)$").expect("static regex is valid")
});

/// A single product in the catalog
///
/// Optional columns are resolved to explicit `Option`s at load time so the
/// search code never sees NaN-like placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
    pub price: String,
    pub top_review: Option<String>,
    pub rating: Option<f64>,
    /// Free-text category list, often several categories joined by commas
    pub category: String,
    pub image_url: Option<String>,
}

impl CatalogEntry {
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: String::new(),
            price: String::new(),
            top_review: None,
            rating: None,
            category: category.into(),
            image_url: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_review(mut self, review: impl Into<String>) -> Self {
        self.top_review = Some(review.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Image URL safe to hand to a client
    ///
    /// Anything that is not an http(s) link to a jpg/jpeg/png/webp file
    /// resolves to [`PLACEHOLDER_IMAGE`].
    pub fn display_image_url(&self) -> &str {
        match self.image_url.as_deref() {
            Some(url) if IMAGE_URL_RE.is_match(url) => url,
            _ => PLACEHOLDER_IMAGE,
        }
    }

    /// File name under which the product image is stored locally:
    /// first 50 characters of the title, spaces replaced by underscores.
    pub fn image_file_name(&self) -> String {
        let stem: String = self.title.chars().take(50).collect();
        format!("{}.jpg", stem.replace(' ', "_"))
    }
}

/// Raw CSV row; every column optional so a short or sparse row still parses
#[derive(Debug, Default, Deserialize)]
struct CatalogRow {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    initial_price: Option<String>,
    #[serde(default)]
    top_review: Option<String>,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    categories: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CatalogRow {
    fn into_entry(self) -> Option<CatalogEntry> {
        let title = non_blank(self.title)?;
        Some(CatalogEntry {
            title,
            url: non_blank(self.url).unwrap_or_default(),
            price: non_blank(self.initial_price).unwrap_or_default(),
            top_review: non_blank(self.top_review),
            rating: non_blank(self.rating).and_then(|r| r.trim().parse::<f64>().ok()),
            category: non_blank(self.categories).unwrap_or_default(),
            image_url: non_blank(self.image_url).map(|u| u.trim().to_string()),
        })
    }
}

/// Ordered, read-only product catalog
///
/// Scan order is the load order and is used as the tie-break everywhere.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load a catalog from a CSV file with a header row
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let catalog = Self::from_csv_reader(file)?;
        info!("Loaded {} catalog entries from {:?}", catalog.len(), path.as_ref());
        Ok(catalog)
    }

    /// Load a catalog from any CSV source. Rows that fail to parse or have
    /// no title are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (line, row) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            match row {
                Ok(row) => match row.into_entry() {
                    Some(entry) => entries.push(entry),
                    None => warn!("Skipping catalog row {}: missing title", line + 1),
                },
                Err(e) => warn!("Skipping catalog row {}: {}", line + 1, e),
            }
        }

        Ok(Self { entries })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    #[inline]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &CatalogEntry)> {
        self.entries.iter().enumerate()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
title,url,initial_price,top_review,rating,categories,image_url,asin
Red Shoe,https://shop/1,$10,Great shoe,4.5,\"Shoes, Women\",https://img/red.jpg,A1
Blue Hat,https://shop/2,$5,,n/a,Hats,not-a-url,A2
,https://shop/3,$1,orphan,1,Misc,,A3
";

    #[test]
    fn test_load_from_csv() {
        let catalog = Catalog::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);

        let shoe = catalog.get(0).unwrap();
        assert_eq!(shoe.title, "Red Shoe");
        assert_eq!(shoe.price, "$10");
        assert_eq!(shoe.rating, Some(4.5));
        assert_eq!(shoe.category, "Shoes, Women");
        assert_eq!(shoe.top_review.as_deref(), Some("Great shoe"));

        let hat = catalog.get(1).unwrap();
        assert_eq!(hat.top_review, None);
        assert_eq!(hat.rating, None);
    }

    #[test]
    fn test_missing_columns_default() {
        let csv = "title,categories\nLamp,Home\n";
        let catalog = Catalog::from_csv_reader(csv.as_bytes()).unwrap();
        let lamp = catalog.get(0).unwrap();
        assert_eq!(lamp.url, "");
        assert_eq!(lamp.image_url, None);
        assert_eq!(lamp.category, "Home");
    }

    #[test]
    fn test_display_image_url() {
        let entry = CatalogEntry::new("x", "y").with_image_url("https://cdn.example.com/a.webp");
        assert_eq!(entry.display_image_url(), "https://cdn.example.com/a.webp");

        let entry = CatalogEntry::new("x", "y").with_image_url("ftp://cdn.example.com/a.jpg");
        assert_eq!(entry.display_image_url(), PLACEHOLDER_IMAGE);

        let entry = CatalogEntry::new("x", "y");
        assert_eq!(entry.display_image_url(), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_image_file_name() {
        let entry = CatalogEntry::new("Red Running Shoe", "Shoes");
        assert_eq!(entry.image_file_name(), "Red_Running_Shoe.jpg");

        let long = "a ".repeat(40);
        let entry = CatalogEntry::new(long, "x");
        let name = entry.image_file_name();
        assert_eq!(name.len(), 50 + ".jpg".len());
    }
}

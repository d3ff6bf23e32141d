// Licensable products: which export columns identify them and which rows they apply to.

use crate::models::Row;

#[derive(Debug, PartialEq, Eq)]
pub struct Product {
    pub name: &'static str,
    /// Column holding the edition (or OS distro).
    pub edition_key: &'static str,
    /// Column holding the version.
    pub version_key: &'static str,
    /// Editions (lowercase) the product applies to; None means any non-empty edition.
    pub editions: Option<&'static [&'static str]>,
    pub count_title: &'static str,
    pub hours_title: &'static str,
}

pub const WINDOWS: Product = Product {
    name: "windows",
    edition_key: "image:OS Distro",
    version_key: "image:OS Version",
    editions: Some(&["windows"]),
    count_title: "Windows Licensing Count",
    hours_title: "Windows Licensing by the hour",
};

pub const SQLSERVER: Product = Product {
    name: "sqlserver",
    edition_key: "image:SQLServer Edition",
    version_key: "image:SQLServer Version",
    editions: None,
    count_title: "SQLServer Licensing Count",
    hours_title: "SQLServer Licensing by the hour",
};

pub const ORACLE: Product = Product {
    name: "oracle",
    edition_key: "image:Oracle Edition",
    version_key: "image:Oracle Version",
    editions: None,
    count_title: "Oracle Licensing Count",
    hours_title: "Oracle Licensing by the hour",
};

impl Product {
    /// Row has a non-empty version and an edition this product covers.
    pub fn relevant(&self, row: &Row) -> bool {
        let non_empty = |key: &str| row.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let (Some(edition), Some(_)) = (non_empty(self.edition_key), non_empty(self.version_key))
        else {
            return false;
        };
        match self.editions {
            Some(editions) => editions.contains(&edition.to_lowercase().as_str()),
            None => true,
        }
    }
}

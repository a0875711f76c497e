use crate::domain::product::Product;
use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;

/// Product catalog, loaded once and read-only afterwards. Catalog order is significant:
/// it is the tiebreak for equal scores.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for product in &products {
            validate_product(product)?;
            anyhow::ensure!(
                seen.insert(product.product_id.as_str()),
                "duplicate product_id in catalog: {}",
                product.product_id
            );
        }
        Ok(Self { products })
    }

    pub fn from_csv_path(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open catalog {}", path.display()))?;
        let catalog = Self::from_reader(file)
            .with_context(|| format!("failed to load catalog {}", path.display()))?;
        tracing::info!(path = %path.display(), products = catalog.len(), "loaded product catalog");
        Ok(catalog)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut products = Vec::new();
        for (row, record) in rdr.deserialize::<Product>().enumerate() {
            // Row 1 is the header.
            products.push(record.with_context(|| format!("invalid catalog row {}", row + 2))?);
        }
        Self::new(products)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn validate_product(product: &Product) -> anyhow::Result<()> {
    anyhow::ensure!(
        !product.product_id.trim().is_empty(),
        "product_id must be non-empty"
    );
    anyhow::ensure!(
        !product.name.trim().is_empty(),
        "name must be non-empty (product_id={})",
        product.product_id
    );
    anyhow::ensure!(
        (1..=5).contains(&product.risk_level),
        "risk_level must be 1..=5 (product_id={}, got {})",
        product.product_id,
        product.risk_level
    );
    anyhow::ensure!(
        product.fee_ratio.is_finite() && product.fee_ratio >= 0.0,
        "fee ratio must be a non-negative number (product_id={}, got {})",
        product.product_id,
        product.fee_ratio
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "product_id,name,type,risk_level,lockup_days,fees,derivatives_exposure,esg\n";

    #[test]
    fn loads_rows_in_order() {
        let csv = format!(
            "{HEADER}opp_001,Short Duration Bond Fund,fund,2,7,0.006,false,true\n\
opp_002,Leveraged Equity Note,structured,5,180,0.012,True,false\n\
opp_017,Short-Term SGD Fixed Deposit Promo,deposit,1,30,0.000,,\n"
        );
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        let ids: Vec<_> = catalog.products().iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, ["opp_001", "opp_002", "opp_017"]);

        let note = &catalog.products()[1];
        assert!(note.derivatives_exposure);
        assert!(!note.esg);
        assert_eq!(note.lockup_days, 180);
        assert_eq!(note.fee_ratio, 0.012);

        let deposit = &catalog.products()[2];
        assert!(!deposit.derivatives_exposure);
        assert!(!deposit.esg);
    }

    #[test]
    fn numeric_and_unknown_flags_load_as_false() {
        let csv = format!(
            "{HEADER}opp_1,A,fund,1,1,0.0,1,0\n\
opp_2,B,fund,1,1,0.0,0,1\n\
opp_3,C,fund,1,1,0.0,yes,no\n"
        );
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog
            .products()
            .iter()
            .all(|p| !p.derivatives_exposure && !p.esg));
    }

    #[test]
    fn rejects_out_of_range_risk() {
        let csv = format!("{HEADER}opp_x,Bad,fund,9,7,0.006,false,true\n");
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("risk_level"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let csv = format!(
            "{HEADER}opp_1,A,fund,1,1,0.0,false,true\nopp_1,B,fund,1,1,0.0,false,true\n"
        );
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn reports_malformed_row_number() {
        let csv = format!("{HEADER}opp_1,A,fund,one,1,0.0,false,true\n");
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn loads_bundled_sample_catalog() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/opportunities.csv");
        let catalog = Catalog::from_csv_path(&path).unwrap();
        assert_eq!(catalog.len(), 20);
    }
}

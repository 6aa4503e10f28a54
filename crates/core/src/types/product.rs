//! Catalog product records.
//!
//! Products are created and edited by the admin side; the storefront only
//! reads them. Field names follow the backend JSON (`nome`, `preco_atacado`,
//! ...); the English aliases accept the static catalog format as well.

use serde::{Deserialize, Serialize};

use super::{Price, PriceResolver, ProductId};

/// Product category. The set is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Pseudo-category listing the whole catalog.
    Novidades,
    Blusas,
    Croppeds,
    Vestidos,
    Conjuntos,
    Saias,
    Calcas,
    Promocoes,
}

impl Category {
    /// Every category, in menu order.
    pub const ALL: [Self; 8] = [
        Self::Novidades,
        Self::Blusas,
        Self::Croppeds,
        Self::Vestidos,
        Self::Conjuntos,
        Self::Saias,
        Self::Calcas,
        Self::Promocoes,
    ];

    /// URL slug, identical to the wire value.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Novidades => "novidades",
            Self::Blusas => "blusas",
            Self::Croppeds => "croppeds",
            Self::Vestidos => "vestidos",
            Self::Conjuntos => "conjuntos",
            Self::Saias => "saias",
            Self::Calcas => "calcas",
            Self::Promocoes => "promocoes",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Novidades => "Novidades",
            Self::Blusas => "Blusas",
            Self::Croppeds => "Croppeds",
            Self::Vestidos => "Vestidos",
            Self::Conjuntos => "Conjuntos",
            Self::Saias => "Saias",
            Self::Calcas => "Calças",
            Self::Promocoes => "Promoções",
        }
    }

    /// Whether a product of category `other` is listed under `self`.
    ///
    /// `Novidades` lists everything.
    #[must_use]
    pub fn matches(self, other: Self) -> bool {
        self == Self::Novidades || self == other
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nome", alias = "name")]
    pub name: String,
    /// Human-facing stock keeping unit. Older catalog entries have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(rename = "categoria", alias = "category")]
    pub category: Category,
    #[serde(rename = "preco_atacado", alias = "price_atacado")]
    pub wholesale_price: Price,
    #[serde(rename = "preco_varejo", alias = "price_varejo")]
    pub retail_price: Price,
    #[serde(default, rename = "tamanhos", alias = "sizes")]
    pub sizes: Vec<String>,
    #[serde(default, rename = "cores", alias = "colors")]
    pub colors: Vec<String>,
    /// Image URLs; the first one is the primary image.
    #[serde(default, rename = "imagens", alias = "images")]
    pub images: Vec<String>,
    #[serde(default, rename = "descricao", alias = "caption")]
    pub caption: String,
    #[serde(default, rename = "estoque", alias = "stock")]
    pub stock: u32,
    #[serde(default = "default_true", rename = "disponivel", alias = "available")]
    pub available: bool,
    #[serde(default, rename = "destaque", alias = "featured")]
    pub featured: bool,
}

const fn default_true() -> bool {
    true
}

impl Product {
    /// The primary image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

impl PriceResolver for Product {
    fn wholesale_price(&self) -> Price {
        self.wholesale_price
    }

    fn retail_price(&self) -> Price {
        self.retail_price
    }
}

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Brand {
    Nike,
    Adidas,
}

impl Brand {
    pub fn key(&self) -> &'static str {
        match self {
            Brand::Nike => "nike",
            Brand::Adidas => "adidas",
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Brand::Nike => write!(f, "Nike"),
            Brand::Adidas => write!(f, "Adidas"),
        }
    }
}

use std::fmt;

/// Storefront countries the session builder knows how to impersonate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    Ar,
    Us,
    Br,
    Cl,
}

impl Country {
    pub fn code(&self) -> &'static str {
        match self {
            Country::Ar => "AR",
            Country::Us => "US",
            Country::Br => "BR",
            Country::Cl => "CL",
        }
    }

    pub fn locale(&self) -> &'static str {
        match self {
            Country::Ar => "es-AR",
            Country::Us => "en-US",
            Country::Br => "pt-BR",
            Country::Cl => "es-CL",
        }
    }

    pub fn accept_language(&self) -> &'static str {
        match self {
            Country::Ar => "es-AR,es;q=0.9",
            Country::Us => "en-US,en;q=0.9",
            Country::Br => "pt-BR,pt;q=0.9",
            Country::Cl => "es-CL,es;q=0.9",
        }
    }

    pub fn currency(&self) -> &'static str {
        match self {
            Country::Ar => "ARS",
            Country::Us => "USD",
            Country::Br => "BRL",
            Country::Cl => "CLP",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

//! Report server edition definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Report server edition, recorded in the bundle manifest as `SourceVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SsrsVersion {
    SqlServer2005,
    SqlServer2008,
    #[default]
    SqlServer2008R2,
    SqlServer2012,
    SqlServer2014,
    SqlServer2016,
    SqlServer2017,
    SqlServer2019,
}

/// Web service endpoint family an edition speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceApi {
    ReportService2005,
    ReportService2010,
}

impl fmt::Display for SsrsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SsrsVersion::SqlServer2005 => "SqlServer2005",
            SsrsVersion::SqlServer2008 => "SqlServer2008",
            SsrsVersion::SqlServer2008R2 => "SqlServer2008R2",
            SsrsVersion::SqlServer2012 => "SqlServer2012",
            SsrsVersion::SqlServer2014 => "SqlServer2014",
            SsrsVersion::SqlServer2016 => "SqlServer2016",
            SsrsVersion::SqlServer2017 => "SqlServer2017",
            SsrsVersion::SqlServer2019 => "SqlServer2019",
        };
        write!(f, "{}", tag)
    }
}

impl FromStr for SsrsVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let short = lowered.strip_prefix("sqlserver").unwrap_or(&lowered);
        match short {
            "2005" => Ok(SsrsVersion::SqlServer2005),
            "2008" => Ok(SsrsVersion::SqlServer2008),
            "2008r2" => Ok(SsrsVersion::SqlServer2008R2),
            "2012" => Ok(SsrsVersion::SqlServer2012),
            "2014" => Ok(SsrsVersion::SqlServer2014),
            "2016" => Ok(SsrsVersion::SqlServer2016),
            "2017" => Ok(SsrsVersion::SqlServer2017),
            "2019" => Ok(SsrsVersion::SqlServer2019),
            _ => Err(crate::Error::Config(format!(
                "Unsupported server version: {}",
                s
            ))),
        }
    }
}

impl SsrsVersion {
    /// Endpoint family used to talk to this edition.
    pub fn api(&self) -> ServiceApi {
        match self {
            SsrsVersion::SqlServer2005 | SsrsVersion::SqlServer2008 => ServiceApi::ReportService2005,
            _ => ServiceApi::ReportService2010,
        }
    }
}

impl ServiceApi {
    /// File name of the service endpoint, appended to the server URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ServiceApi::ReportService2005 => "reportservice2005.asmx",
            ServiceApi::ReportService2010 => "reportservice2010.asmx",
        }
    }
}

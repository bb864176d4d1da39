//! The fixed set of companies the aggregator serves.
//!
//! Company identity appears in two spellings on the wire: the uppercase
//! listing code (`?company=NAVER`) and the lowercase subscription key
//! stored in user settings (`"naver"`). Both map onto this one enum.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Company {
    Naver,
    Kakao,
    Line,
    Coupang,
    Baemin,
    Karrot,
    Toss,
    Yanolja,
}

/// A company string that matches neither spelling.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown company: {0}")]
pub struct UnknownCompany(pub String);

impl Company {
    pub const ALL: [Company; 8] = [
        Company::Naver,
        Company::Kakao,
        Company::Line,
        Company::Coupang,
        Company::Baemin,
        Company::Karrot,
        Company::Toss,
        Company::Yanolja,
    ];

    /// Uppercase code used by the listing endpoint.
    pub fn code(&self) -> &'static str {
        match self {
            Company::Naver => "NAVER",
            Company::Kakao => "KAKAO",
            Company::Line => "LINE",
            Company::Coupang => "COUPANG",
            Company::Baemin => "BAEMIN",
            Company::Karrot => "KARROT",
            Company::Toss => "TOSS",
            Company::Yanolja => "YANOLJA",
        }
    }

    /// Lowercase key used in the settings document.
    pub fn subscription_key(&self) -> &'static str {
        match self {
            Company::Naver => "naver",
            Company::Kakao => "kakao",
            Company::Line => "line",
            Company::Coupang => "coupang",
            Company::Baemin => "baemin",
            Company::Karrot => "karrot",
            Company::Toss => "toss",
            Company::Yanolja => "yanolja",
        }
    }

    /// Korean display name.
    pub fn label(&self) -> &'static str {
        match self {
            Company::Naver => "네이버",
            Company::Kakao => "카카오",
            Company::Line => "라인",
            Company::Coupang => "쿠팡",
            Company::Baemin => "배달의민족",
            Company::Karrot => "당근마켓",
            Company::Toss => "토스",
            Company::Yanolja => "야놀자",
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Company {
    type Err = UnknownCompany;

    /// Accepts either exact spelling. Mixed-case forms are rejected, the
    /// wire never produces them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Company::ALL
            .iter()
            .copied()
            .find(|c| s == c.code() || s == c.subscription_key())
            .ok_or_else(|| UnknownCompany(s.to_string()))
    }
}

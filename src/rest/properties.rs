/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use num_enum::IntoPrimitive;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoPrimitive)]
#[repr(u8)]
pub enum SafetyLevel {
    Safe = 1,
    Moderate = 2,
    Restricted = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoPrimitive)]
#[repr(u8)]
pub enum ContentType {
    Photo = 1,
    Screenshot = 2,
    Other = 3,
}

// Whether the photo shows up in global search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoPrimitive)]
#[repr(u8)]
pub enum HiddenLevel {
    Public = 1,
    Hidden = 2,
}

/// Extra photo attributes that list style methods can be asked to return
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, IntoStaticStr, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Extras {
    License,
    DateUpload,
    DateTaken,
    OwnerName,
    IconServer,
    OriginalFormat,
    LastUpdate,
    Geo,
    Tags,
    MachineTags,
    #[strum(to_string = "o_dims")]
    ODims,
    Media,
    Views,
    PathAlias,
    #[strum(to_string = "url_s")]
    UrlS,
    #[strum(to_string = "url_sq")]
    UrlSq,
    #[strum(to_string = "url_t")]
    UrlT,
    #[strum(to_string = "url_m")]
    UrlM,
    #[strum(to_string = "url_l")]
    UrlL,
    #[strum(to_string = "url_o")]
    UrlO,
}

impl Extras {
    /// Name of the request parameter the extras are sent in
    pub const KEY: &'static str = "extras";

    /// The smallest useful set, used by convenience list calls
    pub const MIN: [Extras; 2] = [Extras::OriginalFormat, Extras::OwnerName];

    /// Every known extra
    pub fn all() -> Vec<Extras> {
        use strum::IntoEnumIterator;
        Extras::iter().collect()
    }

    /// Joins the extras into the comma separated form the API expects
    pub fn join(extras: &[Extras]) -> String {
        let mut names: Vec<&'static str> = extras.iter().map(|e| e.into()).collect();
        names.sort_unstable();
        names.dedup();
        names.join(",")
    }
}

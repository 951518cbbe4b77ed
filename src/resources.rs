//! Static descriptors for every resource type the API exposes.
//!
//! A descriptor is pure data: the path segment, the attributes kept when mapping a
//! response, and the keys whose values are nested resources to be mapped recursively.
//! The generic engine in [`crate::client`] and [`crate::mapper`] does the rest.

use reqwest::Method;

#[derive(Debug, PartialEq)]
pub struct Descriptor {
    pub name: &'static str,
    pub path: &'static str,
    /// Plain attributes, copied verbatim from responses.
    pub attributes: &'static [&'static str],
    /// Attributes holding expanded objects (a single object or a list of them).
    pub embedded: &'static [Embedded],
    pub update_method: UpdateMethod,
    /// Create and save go out as multipart with a streamed `file` part.
    pub accepts_upload: bool,
}

#[derive(Debug, PartialEq)]
pub struct Embedded {
    pub key: &'static str,
    pub descriptor: &'static Descriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMethod {
    Put,
    Post,
}

impl UpdateMethod {
    pub fn method(self) -> Method {
        match self {
            UpdateMethod::Put => Method::PUT,
            UpdateMethod::Post => Method::POST,
        }
    }
}

pub const ID: &str = "id";

impl Descriptor {
    pub fn embedded(&self, key: &str) -> Option<&'static Descriptor> {
        self.embedded
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.descriptor)
    }

    pub fn is_attribute(&self, key: &str) -> bool {
        self.attributes.contains(&key)
    }

    /// Plain or embedded; anything else is dropped by the mapper.
    pub fn recognizes(&self, key: &str) -> bool {
        self.is_attribute(key) || self.embedded(key).is_some()
    }

    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }
}

const COUNTERS: [&str; 24] = [
    "lifetime_impressions",
    "monthly_impressions",
    "daily_impressions",
    "hourly_impressions",
    "unique_lifetime_impressions",
    "unique_monthly_impressions",
    "unique_daily_impressions",
    "unique_hourly_impressions",
    "lifetime_clicks",
    "monthly_clicks",
    "daily_clicks",
    "hourly_clicks",
    "unique_lifetime_clicks",
    "unique_monthly_clicks",
    "unique_daily_clicks",
    "unique_hourly_clicks",
    "lifetime_ctr",
    "monthly_ctr",
    "daily_ctr",
    "hourly_ctr",
    "unique_lifetime_ctr",
    "unique_monthly_ctr",
    "unique_daily_ctr",
    "unique_hourly_ctr",
];

const fn concat<const A: usize, const B: usize, const N: usize>(
    head: [&'static str; A],
    tail: [&'static str; B],
) -> [&'static str; N] {
    assert!(A + B == N);
    let mut out = [""; N];
    let mut i = 0;
    while i < A {
        out[i] = head[i];
        i += 1;
    }
    let mut j = 0;
    while j < B {
        out[A + j] = tail[j];
        j += 1;
    }
    out
}

pub static ADVERTISER: Descriptor = Descriptor {
    name: "advertiser",
    path: "advertisers",
    attributes: &["id", "name", "created_at", "updated_at"],
    embedded: &[],
    update_method: UpdateMethod::Put,
    accepts_upload: false,
};

pub static AD_SIZE: Descriptor = Descriptor {
    name: "ad size",
    path: "ad-sizes",
    attributes: &["id", "name", "width", "height", "created_at", "updated_at"],
    embedded: &[],
    update_method: UpdateMethod::Put,
    accepts_upload: false,
};

const CAMPAIGN_ATTRIBUTES: [&str; 29] = concat(
    ["id", "advertiser_id", "name", "created_at", "updated_at"],
    COUNTERS,
);

pub static CAMPAIGN: Descriptor = Descriptor {
    name: "campaign",
    path: "campaigns",
    attributes: &CAMPAIGN_ATTRIBUTES,
    embedded: &[Embedded {
        key: "advertiser",
        descriptor: &ADVERTISER,
    }],
    update_method: UpdateMethod::Put,
    accepts_upload: false,
};

pub static CREATIVE: Descriptor = Descriptor {
    name: "creative",
    path: "creatives",
    attributes: &[
        "id",
        "advertiser_id",
        "type",
        "name",
        "description",
        "url",
        "destination_url",
        "alt_text",
        "third_party_pixel_url",
        "width",
        "height",
        "video_frame_rate",
        "video_duration",
        "title",
        "body",
        "html",
        "tag_domain",
        "created_at",
        "updated_at",
    ],
    embedded: &[Embedded {
        key: "advertiser",
        descriptor: &ADVERTISER,
    }],
    // multipart bodies can't ride on PUT
    update_method: UpdateMethod::Post,
    accepts_upload: true,
};

pub static PRIORITY: Descriptor = Descriptor {
    name: "priority",
    path: "priorities",
    attributes: &["id", "name", "weight", "created_at", "updated_at"],
    embedded: &[],
    update_method: UpdateMethod::Put,
    accepts_upload: false,
};

pub static PUBLISHER: Descriptor = Descriptor {
    name: "publisher",
    path: "publishers",
    attributes: &["id", "name", "created_at", "updated_at"],
    embedded: &[],
    update_method: UpdateMethod::Put,
    accepts_upload: false,
};

pub static ZONE: Descriptor = Descriptor {
    name: "zone",
    path: "zones",
    attributes: &[
        "id",
        "publisher_id",
        "type",
        "name",
        "is_dynamic_size",
        "width",
        "height",
        "refresh_rate",
        "created_at",
        "updated_at",
    ],
    embedded: &[Embedded {
        key: "publisher",
        descriptor: &PUBLISHER,
    }],
    update_method: UpdateMethod::Put,
    accepts_upload: false,
};

pub static ZONE_GROUP: Descriptor = Descriptor {
    name: "zone group",
    path: "zone-groups",
    attributes: &["id", "name", "zone_ids", "created_at", "updated_at"],
    embedded: &[Embedded {
        key: "zones",
        descriptor: &ZONE,
    }],
    update_method: UpdateMethod::Put,
    accepts_upload: false,
};

const PLACEMENT_ATTRIBUTES: [&str; 62] = concat(
    [
        "id",
        "campaign_id",
        "priority_id",
        "creative_ids",
        "name",
        "enabled",
        "html_target",
        "app_target",
        "delivery_method",
        "lifetime_dates_enabled",
        "lifetime_start",
        "lifetime_end",
        "lifetime_quota_enabled",
        "lifetime_quota_amount",
        "lifetime_quota_type",
        "under_delivery_behaviour",
        "pricing_enabled",
        "pricing_method",
        "rate_cpm",
        "rate_cpc",
        "rate_cpa",
        "fixed_cost",
        "publisher_payout_ratio",
        "per_user_limit_enabled",
        "per_user_limit_amount",
        "per_user_limit_type",
        "per_user_limit_period",
        "frequency_limit_enabled",
        "frequency_limit_amount",
        "frequency_limit_type",
        "frequency_limit_period",
        "keywords",
        "keyword_match_method",
        "zone_ids",
        "zone_group_ids",
        "zone_all_ids",
        "created_at",
        "updated_at",
    ],
    COUNTERS,
);

pub static PLACEMENT: Descriptor = Descriptor {
    name: "placement",
    path: "placements",
    attributes: &PLACEMENT_ATTRIBUTES,
    embedded: &[
        Embedded {
            key: "campaign",
            descriptor: &CAMPAIGN,
        },
        Embedded {
            key: "priority",
            descriptor: &PRIORITY,
        },
        Embedded {
            key: "creatives",
            descriptor: &CREATIVE,
        },
        Embedded {
            key: "zones",
            descriptor: &ZONE,
        },
        Embedded {
            key: "zone_groups",
            descriptor: &ZONE_GROUP,
        },
    ],
    update_method: UpdateMethod::Put,
    accepts_upload: false,
};

pub fn all() -> [&'static Descriptor; 9] {
    [
        &ADVERTISER,
        &AD_SIZE,
        &CAMPAIGN,
        &CREATIVE,
        &PLACEMENT,
        &PRIORITY,
        &PUBLISHER,
        &ZONE,
        &ZONE_GROUP,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_descriptor_has_an_id_and_no_overlap() {
        for d in all() {
            assert!(d.is_attribute(ID), "{} lacks id", d.name);
            for e in d.embedded {
                assert!(
                    !d.is_attribute(e.key),
                    "{}: `{}` is both plain and embedded",
                    d.name,
                    e.key
                );
            }
            let unique: HashSet<_> = d.attributes.iter().collect();
            assert_eq!(unique.len(), d.attributes.len(), "{} repeats an attribute", d.name);
        }
    }

    #[test]
    fn counters_are_appended() {
        assert!(CAMPAIGN.is_attribute("unique_hourly_ctr"));
        assert!(PLACEMENT.is_attribute("lifetime_impressions"));
        assert!(PLACEMENT.is_attribute("zone_all_ids"));
        assert!(!ADVERTISER.is_attribute("lifetime_impressions"));
    }

    #[test]
    fn embedded_lookup() {
        assert_eq!(PLACEMENT.embedded("campaign"), Some(&CAMPAIGN));
        assert_eq!(CAMPAIGN.embedded("advertiser"), Some(&ADVERTISER));
        assert_eq!(ZONE_GROUP.embedded("zones"), Some(&ZONE));
        assert!(PLACEMENT.recognizes("zone_groups"));
        assert!(!PLACEMENT.recognizes("advertiser"));
        assert_eq!(PLACEMENT.item_path("7"), "placements/7");
    }
}

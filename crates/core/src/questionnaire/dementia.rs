use crate::form::schema::{FieldDef, SectionDef, flag, list, text};

// Stage choices are stored as the selected option's key, e.g.
// "extend_life", "balanced" or "comfort_first".

pub(super) const SECTIONS: &[SectionDef] = &[
    SectionDef {
        id: 1,
        title: "About You",
        description: "Who this plan belongs to.",
        icon: "user",
        fields: &[
            text("personal.full_name"),
            text("personal.preferred_name"),
            text("personal.date_of_birth"),
            text("personal.primary_language"),
        ],
    },
    SectionDef {
        id: 2,
        title: "What Matters Most",
        description: "The values that should guide decisions about your care.",
        icon: "heart",
        fields: &[
            text("values.what_matters_most"),
            text("values.good_day"),
            text("values.fears_and_worries"),
        ],
    },
    SectionDef {
        id: 3,
        title: "Mild Dementia",
        description: "Forgetful, but still living mostly independently.",
        icon: "sun",
        fields: &[
            text("stage_mild.goal"),
            text("stage_mild.hospital_care"),
            text("stage_mild.cpr"),
        ],
    },
    SectionDef {
        id: 4,
        title: "Moderate Dementia",
        description: "Needing help with daily activities such as dressing or bathing.",
        icon: "cloud-sun",
        fields: &[
            text("stage_moderate.goal"),
            text("stage_moderate.hospital_care"),
            text("stage_moderate.cpr"),
        ],
    },
    SectionDef {
        id: 5,
        title: "Severe Dementia",
        description: "No longer able to communicate or recognize loved ones.",
        icon: "cloud",
        fields: &[
            text("stage_severe.goal"),
            text("stage_severe.hospital_care"),
            text("stage_severe.cpr"),
            text("stage_severe.feeding_tube"),
        ],
    },
    SectionDef {
        id: 6,
        title: "Where You Want to Live",
        description: "Living arrangements as care needs grow.",
        icon: "home",
        fields: &[
            text("living.preferred_setting"),
            text("living.care_at_home_limits"),
            flag("living.memory_care_acceptable"),
        ],
    },
    SectionDef {
        id: 7,
        title: "Sharing Your Wishes",
        description: "Who speaks for you and who knows your wishes.",
        icon: "users",
        fields: &[
            text("sharing.decision_maker_name"),
            text("sharing.decision_maker_phone"),
            flag("sharing.discussed_with_family"),
            text("sharing.additional_wishes"),
        ],
    },
];

/// Fields kept with the form but not counted toward completion.
pub(super) const UNTRACKED: &[FieldDef] = &[
    flag("values.important.family_time"),
    flag("values.important.independence"),
    flag("values.important.faith"),
    flag("values.important.being_at_home"),
    flag("values.important.mental_sharpness"),
    flag("values.important.physical_comfort"),
    text("stage_mild.notes"),
    text("stage_moderate.notes"),
    text("stage_severe.notes"),
    list("sharing.copies_given_to"),
    text("trainer_notes"),
];

use crate::form::schema::{FieldDef, SectionDef, flag, list, text};

pub(super) const SECTIONS: &[SectionDef] = &[
    SectionDef {
        id: 1,
        title: "Personal Details",
        description: "Identifying details for the person making this document.",
        icon: "id-card",
        fields: &[
            text("person.full_name"),
            text("person.date_of_birth"),
            text("person.address"),
            text("person.phone"),
        ],
    },
    SectionDef {
        id: 2,
        title: "Health Care Agent",
        description: "The person you trust to make decisions if you cannot.",
        icon: "user-check",
        fields: &[
            text("agent.primary.name"),
            text("agent.primary.relationship"),
            text("agent.primary.phone"),
            text("agent.alternate.name"),
            text("agent.alternate.phone"),
        ],
    },
    SectionDef {
        id: 3,
        title: "Life-Sustaining Treatment",
        description: "Treatments you would or would not want near the end of life.",
        icon: "activity",
        fields: &[
            text("treatment.cpr"),
            text("treatment.mechanical_ventilation"),
            text("treatment.artificial_nutrition"),
            text("treatment.dialysis"),
            text("treatment.antibiotics"),
        ],
    },
    SectionDef {
        id: 4,
        title: "Comfort and Dignity",
        description: "How you want to feel and be cared for.",
        icon: "feather",
        fields: &[
            text("comfort.pain_management"),
            text("comfort.place_of_care"),
            text("comfort.people_present"),
            text("comfort.music_or_readings"),
        ],
    },
    SectionDef {
        id: 5,
        title: "Spiritual and Cultural Wishes",
        description: "Traditions, beliefs and rituals that matter to you.",
        icon: "star",
        fields: &[
            text("spiritual.tradition"),
            text("spiritual.clergy_contact"),
            text("spiritual.rituals"),
        ],
    },
    SectionDef {
        id: 6,
        title: "After Death",
        description: "Wishes for your body and your memorial.",
        icon: "sunset",
        fields: &[
            text("after_death.organ_donation"),
            text("after_death.body_disposition"),
            text("after_death.service_wishes"),
        ],
    },
    SectionDef {
        id: 7,
        title: "Signatures",
        description: "Acknowledgement and witnesses.",
        icon: "pen-tool",
        fields: &[
            flag("signatures.member_acknowledged"),
            text("signatures.signed_on"),
            text("signatures.witness_one"),
            text("signatures.witness_two"),
        ],
    },
];

/// Fields kept with the form but not counted toward completion.
pub(super) const UNTRACKED: &[FieldDef] = &[
    flag("comfort.avoid.restraints"),
    flag("comfort.avoid.loud_rooms"),
    flag("comfort.avoid.bright_lights"),
    flag("comfort.avoid.unfamiliar_visitors"),
    list("after_death.donation_types"),
    text("notes"),
];

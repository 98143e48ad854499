//! Internationalization (i18n) module for operator-facing messages.

/// UI messages structure
#[derive(Debug, Clone)]
pub struct Messages {
    pub setup_title: &'static str,
    pub setup_min_focus: &'static str,
    pub setup_mount_motor: &'static str,
    pub setup_lighting: &'static str,
    pub setup_incomplete: &'static str,
    pub confirm_prompt: &'static str,
    pub select_subject: &'static str,
    pub focus_time: &'static str,
    pub focus_distance: &'static str,
    pub focus_subject: &'static str,
    pub person: &'static str,
    pub reset_tracking: &'static str,
    pub tracking_lost: &'static str,
    pub homing: &'static str,
    pub goodbye: &'static str,
}

/// German messages
pub static MESSAGES_DE: Messages = Messages {
    setup_title: "Führen Sie folgende Kalibrierungsschritte aus und bestätigen Sie, um zu starten:",
    setup_min_focus: "Stellen Sie den Fokusring auf den minimalen Fokusabstand ein.",
    setup_mount_motor: "Bringen Sie den Schrittmotor an den Fokusring und befestigen ihn.",
    setup_lighting: "Wählen Sie die Lichtbedingung Ihrer Szene aus:",
    setup_incomplete: "Bitte alle Kalibrierungsschritte durchführen!",
    confirm_prompt: "Erledigt? (j/n)",
    select_subject: "Antippen, um das Fokussobjekt auszuwählen",
    focus_time: "Fokusszeit",
    focus_distance: "Fokusabstand",
    focus_subject: "Fokussperson",
    person: "Person",
    reset_tracking: "Tracking zurückgesetzt",
    tracking_lost: "Fokuspunkt verloren, bitte neu auswählen",
    homing: "Motor fährt in die Ausgangsposition",
    goodbye: "Auf Wiedersehen!",
};

/// English messages
pub static MESSAGES_EN: Messages = Messages {
    setup_title: "Complete the following setup steps and confirm to start:",
    setup_min_focus: "Turn the focus ring to its minimum focus distance.",
    setup_mount_motor: "Attach the stepper motor to the focus ring and fasten it.",
    setup_lighting: "Select the lighting condition of your scene:",
    setup_incomplete: "Please complete all setup steps!",
    confirm_prompt: "Done? (y/n)",
    select_subject: "Tap to select the focus subject",
    focus_time: "Focus time",
    focus_distance: "Focus distance",
    focus_subject: "Focus subject",
    person: "Person",
    reset_tracking: "Tracking reset",
    tracking_lost: "Focus point lost, please select again",
    homing: "Motor returning to home position",
    goodbye: "Goodbye!",
};

/// Get UI messages by language.
///
/// # Arguments
/// * `lang` - Language code, "de" for German, "en" for English.
///
/// # Returns
/// Reference to Messages struct. Unknown codes fall back to German, the
/// language of the rig's operators.
pub fn get_messages(lang: &str) -> &'static Messages {
    match lang {
        "en" => &MESSAGES_EN,
        _ => &MESSAGES_DE,
    }
}

/// Whether an interactive answer counts as a confirmation in either language.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "j" | "ja"
    )
}

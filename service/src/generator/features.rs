use bitflags::bitflags;

bitflags! {
    /// Template generation features to enable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TemplateFeatures: u8 {
        /// Geometry columns take well-known-text input.
        const CONVERT_WKT = 0b0001;
        /// Roll child-sheet fields up into the main sheet when flattening.
        const ROLLUP = 0b0010;
        /// Freeze the header rows and the header column.
        const FREEZE_HEADERS = 0b0100;

        /// Features enabled unless turned off (default).
        const DEFAULT = Self::CONVERT_WKT.bits()
                      | Self::FREEZE_HEADERS.bits();

        /// No features.
        const NONE = 0b0000;
    }
}

impl Default for TemplateFeatures {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Presets compiled into the binary, in registry index order.
pub fn embedded_manifests() -> &'static [(&'static str, &'static str)] {
    &[
        ("radial-bars", include_str!("../../templates/radial_bars.json")),
        ("radial-bars-fire", include_str!("../../templates/radial_bars_fire.json")),
        ("mirror-bars", include_str!("../../templates/mirror_bars.json")),
        ("layered-rings", include_str!("../../templates/layered_rings.json")),
        ("rings-ice", include_str!("../../templates/rings_ice.json")),
        ("particle-field", include_str!("../../templates/particle_field.json")),
        ("particle-storm", include_str!("../../templates/particle_storm.json")),
        ("waterfall", include_str!("../../templates/waterfall.json")),
    ]
}

//! Tests for SpotLightInstance: scale mutator, update codec, fields.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use crate::behavior::spotlight::*;
    use crate::behavior::{BehaviorInstance, BehaviorTemplate, FieldKind};
    use crate::net::{BitStream, ENABLED_MASK, INITIAL_UPDATE_MASK, UPDATE_MASK};

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_defaults() {
        let light = SpotLightInstance::new();
        assert_eq!(light.range, 10.0);
        assert_eq!(light.inner_cone_angle, 40.0);
        assert_eq!(light.outer_cone_angle, 45.0);
        assert!(!light.is_dirty());
    }

    #[test]
    fn test_set_scale_random_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut light = SpotLightInstance::new();

        for _ in 0..2000 {
            let scale = Vec3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-5.0..60.0),
                rng.gen_range(-20.0..20.0),
            );
            light.set_scale(scale);

            assert_eq!(light.range, scale.y.max(0.05));
            assert!(light.range > 0.0);
            assert!(
                light.inner_cone_angle <= light.outer_cone_angle,
                "inner {} > outer {} for scale {:?}",
                light.inner_cone_angle,
                light.outer_cone_angle,
                scale
            );
            assert!(light.outer_cone_angle > 0.0);
            assert!(light.outer_cone_angle <= 180.0 + EPSILON);
        }
    }

    #[test]
    fn test_zero_scale_boundary() {
        let mut light = SpotLightInstance::new();
        light.set_scale(Vec3::ZERO);

        // radius clamp → 0.05, range → 0.05, asin(1) * 2 = 180°
        assert_eq!(light.range, 0.05);
        assert!((light.outer_cone_angle - 180.0).abs() < EPSILON);
        assert_eq!(light.inner_cone_angle, 40.0);
        assert_eq!(light.base().scale, Vec3::new(0.05, 0.05, 0.05));
    }

    #[test]
    fn test_scale_narrow_cone() {
        let mut light = SpotLightInstance::new();
        light.set_scale(Vec3::new(2.0, 10.0, 2.0));

        let expected = 0.2f32.asin().to_degrees() * 2.0;
        assert_eq!(light.range, 10.0);
        assert!((light.outer_cone_angle - expected).abs() < EPSILON);
        // inner 40° > outer ~23° → прижат к outer
        assert_eq!(light.inner_cone_angle, light.outer_cone_angle);
    }

    #[test]
    fn test_scale_radius_clamped_to_range() {
        let mut light = SpotLightInstance::new();
        light.set_scale(Vec3::new(100.0, 1.0, 100.0));

        assert_eq!(light.range, 1.0);
        assert!((light.outer_cone_angle - 180.0).abs() < EPSILON);
        assert_eq!(light.base().scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_wide_cone_keeps_inner_angle() {
        let mut light = SpotLightInstance::new();
        light.set_scale(Vec3::new(8.0, 10.0, 8.0));

        // asin(0.8) * 2 ≈ 106°
        assert!(light.outer_cone_angle > 100.0);
        assert_eq!(light.inner_cone_angle, 40.0);
    }

    #[test]
    fn test_non_finite_scale_stays_finite() {
        let nan = f32::NAN;
        let inf = f32::INFINITY;
        let cases = [
            Vec3::splat(inf),
            Vec3::splat(-inf),
            Vec3::splat(nan),
            Vec3::splat(f32::MAX),
            Vec3::new(inf, 10.0, -inf),
            Vec3::new(1.0, nan, 1.0),
            Vec3::new(1.0, inf, 1.0),
            Vec3::new(nan, -inf, inf),
        ];

        for scale in cases {
            let mut light = SpotLightInstance::new();
            light.set_scale(scale);

            assert!(light.range.is_finite(), "range {} for {:?}", light.range, scale);
            assert!(light.outer_cone_angle.is_finite(), "outer NaN for {:?}", scale);
            assert!(light.inner_cone_angle.is_finite());
            assert!(light.range >= 0.05);
            assert!(
                light.inner_cone_angle <= light.outer_cone_angle,
                "inner {} > outer {} for scale {:?}",
                light.inner_cone_angle,
                light.outer_cone_angle,
                scale
            );
            assert!(light.outer_cone_angle > 0.0);
            assert!(light.outer_cone_angle <= 180.0 + EPSILON);
            assert!(light.base().scale.is_finite());
        }
    }

    #[test]
    fn test_infinite_scale_is_widest_cone() {
        let mut light = SpotLightInstance::new();
        light.set_scale(Vec3::splat(f32::INFINITY));

        assert_eq!(light.range, f32::MAX);
        assert!((light.outer_cone_angle - 180.0).abs() < EPSILON);
        assert_eq!(light.inner_cone_angle, 40.0);
    }

    #[test]
    fn test_nan_radius_clamps_to_minimum() {
        let mut light = SpotLightInstance::new();
        light.set_scale(Vec3::new(f32::NAN, 1.0, 0.0));

        // radius → MIN_RADIUS: asin(0.05 / 1) * 2 ≈ 5.73°
        let expected = 0.05f32.asin().to_degrees() * 2.0;
        assert_eq!(light.range, 1.0);
        assert!((light.outer_cone_angle - expected).abs() < EPSILON);
        assert_eq!(light.inner_cone_angle, light.outer_cone_angle);
        assert_eq!(light.base().scale, Vec3::new(0.05, 1.0, 0.05));
    }

    #[test]
    fn test_set_scale_marks_update_mask() {
        let mut light = SpotLightInstance::new();
        light.set_scale(Vec3::ONE);

        assert_eq!(light.dirty_mask(), UPDATE_MASK);
    }

    #[test]
    fn test_object_scale_matches_cone() {
        let mut light = SpotLightInstance::new();
        light.set_scale(Vec3::new(3.0, 12.0, 5.0));

        let scale = light.object_scale();
        assert!((scale.x - 4.0).abs() < EPSILON);
        assert_eq!(scale.y, 12.0);
        assert!((light.cone_radius() - light.base().scale.x).abs() < EPSILON);
    }

    #[test]
    fn test_round_trip_bitwise() {
        let mut sender = SpotLightInstance::new();
        sender.set_scale(Vec3::new(1.3, 7.77, 0.9));
        sender.inner_cone_angle = 3.333_333;

        let mut stream = BitStream::new();
        let unsent = sender.pack_update(sender.dirty_mask(), &mut stream);
        assert_eq!(unsent, 0);

        let mut reader = BitStream::from_bytes(stream.into_bytes());
        let mut receiver = SpotLightInstance::new();
        receiver.unpack_update(&mut reader).unwrap();

        assert_eq!(receiver.range.to_bits(), sender.range.to_bits());
        assert_eq!(receiver.inner_cone_angle.to_bits(), sender.inner_cone_angle.to_bits());
        assert_eq!(receiver.outer_cone_angle.to_bits(), sender.outer_cone_angle.to_bits());
    }

    #[test]
    fn test_presence_unset_leaves_fields() {
        let mut sender = SpotLightInstance::new();
        sender.range = 99.0;

        let mut stream = BitStream::new();
        sender.pack_update(ENABLED_MASK, &mut stream);
        stream.rewind();

        let mut receiver = SpotLightInstance::new();
        receiver.range = 1.5;
        receiver.inner_cone_angle = 5.0;
        receiver.outer_cone_angle = 6.0;
        receiver.unpack_update(&mut stream).unwrap();

        assert_eq!(receiver.range, 1.5);
        assert_eq!(receiver.inner_cone_angle, 5.0);
        assert_eq!(receiver.outer_cone_angle, 6.0);
    }

    #[test]
    fn test_wire_layout_sizes() {
        let light = SpotLightInstance::new();

        let mut stream = BitStream::new();
        light.pack_update(UPDATE_MASK, &mut stream);
        // flag + 3 * f32 + parent flag
        assert_eq!(stream.bit_len(), 1 + 96 + 1);

        let mut stream = BitStream::new();
        light.pack_update(INITIAL_UPDATE_MASK, &mut stream);
        // + enabled bit
        assert_eq!(stream.bit_len(), 1 + 96 + 1 + 1);

        let mut stream = BitStream::new();
        light.pack_update(0, &mut stream);
        assert_eq!(stream.bit_len(), 2);
    }

    #[test]
    fn test_truncated_payload_is_error() {
        let light = SpotLightInstance::new();
        let mut stream = BitStream::new();
        light.pack_update(UPDATE_MASK, &mut stream);

        // Обрезаем до 4 байт: флаг + неполный range
        let bytes = stream.into_bytes()[..4].to_vec();
        let mut reader = BitStream::from_bytes(bytes);
        let mut receiver = SpotLightInstance::new();
        assert!(receiver.unpack_update(&mut reader).is_err());
    }

    #[test]
    fn test_field_schema_order() {
        let light = SpotLightInstance::new();
        let fields = light.fields();
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();

        assert_eq!(names, vec!["range", "innerAngle", "outerAngle", "enabled"]);
        assert!(fields[..3].iter().all(|f| f.group == Some("Light") && f.kind == FieldKind::F32));
        assert_eq!(fields[3].group, Some("Behavior"));
        assert!(light.get_field("scale").is_err());
    }

    #[test]
    fn test_inspector_edit_conforms() {
        let mut light = SpotLightInstance::new();
        light.set_field("range", "-3").unwrap();
        light.set_field("outerAngle", "30").unwrap();
        light.set_field("innerAngle", "90").unwrap();
        assert!(!light.is_dirty());

        light.inspect_post_apply();

        assert_eq!(light.range, 0.05);
        assert_eq!(light.outer_cone_angle, 30.0);
        assert_eq!(light.inner_cone_angle, 30.0);
        assert_eq!(light.dirty_mask(), UPDATE_MASK | ENABLED_MASK);
    }

    #[test]
    fn test_enabled_field_replicates() {
        let mut sender = SpotLightInstance::new();
        sender.set_field("enabled", "0").unwrap();
        assert_eq!(sender.dirty_mask(), ENABLED_MASK);

        let mut stream = BitStream::new();
        sender.pack_update(sender.dirty_mask(), &mut stream);
        stream.rewind();

        let mut receiver = SpotLightInstance::new();
        receiver.unpack_update(&mut stream).unwrap();
        assert!(!receiver.base().enabled);
        assert_eq!(receiver.range, 10.0);
    }

    #[test]
    fn test_template_applies_field_defaults() {
        let template = SpotLightBehavior::new()
            .with_field("range", "Light range", "25")
            .with_field("outerAngle", "Cone", "60");

        let instance = template.create_instance().unwrap();
        let light = instance.as_any().downcast_ref::<SpotLightInstance>().unwrap();

        assert_eq!(light.range, 25.0);
        assert_eq!(light.outer_cone_angle, 60.0);
        assert_eq!(light.inner_cone_angle, 40.0);
    }

    #[test]
    fn test_template_rejects_bad_default() {
        let template = SpotLightBehavior::new().with_field("innerAngle", "", "wide");
        assert!(template.create_instance().is_none());

        let template = SpotLightBehavior::new().with_field("color", "", "1 1 1");
        assert!(template.create_instance().is_none());
    }

    #[test]
    fn test_template_net_flags() {
        let template = SpotLightBehavior::new();
        assert!(template.net_flags().contains(crate::net::NetFlags::SCOPE_ALWAYS));

        let instance = template.create_instance().unwrap();
        assert!(instance.net_flags().contains(crate::net::NetFlags::GHOSTABLE));
        assert!(!instance.net_flags().contains(crate::net::NetFlags::SCOPE_ALWAYS));
    }
}

//! End-to-end field visualization tests.
//!
//! These drive the public entry points the way a scene loader would: build a
//! descriptor, dispatch it, and inspect the buffers handed to the renderer.

use proptest::prelude::*;
use volum::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn two_vectors(style: GlyphStyle) -> Result<VectorFieldDescriptor> {
    VectorFieldDescriptor::new(
        vec![Vec3::ZERO, Vec3::ONE],
        vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0)],
        Bounds::UNIT,
        style,
        ColorSource::ramp_named("viridis"),
    )
}

#[test]
fn magnitudes_normalize_and_remap() {
    init_logging();
    let style = GlyphStyle {
        min_length: 0.1,
        max_length: 1.0,
        channel: ColorChannel::resolve("magnitude"),
    };
    let field = two_vectors(style).unwrap();

    let stats = FieldStatistics::from_magnitudes(field.vectors()).unwrap();
    assert_eq!((stats.min, stats.max), (1.0, 2.0));

    let output = visualize(&field.into(), &VisualizationOptions::default()).unwrap();
    let FieldOutput::Glyphs(GlyphOutput::Cpu(glyphs)) = output else {
        panic!("two glyphs should stay on the cpu path");
    };
    assert_eq!(glyphs.magnitudes, vec![0.0, 1.0]);

    let lengths: Vec<f32> = glyphs
        .transforms
        .iter()
        .map(|m| m.to_scale_rotation_translation().0.x)
        .collect();
    assert!((lengths[0] - 0.1).abs() < 1e-5, "{lengths:?}");
    assert!((lengths[1] - 1.0).abs() < 1e-5, "{lengths:?}");

    let colors = glyphs.colors.unwrap();
    assert_eq!(colors[0], evaluate("viridis", 0.0));
    assert_eq!(colors[1], evaluate("viridis", 1.0));
}

#[test]
fn empty_vector_field_is_rejected() {
    init_logging();
    let err = VectorFieldDescriptor::new(
        vec![],
        vec![],
        Bounds::UNIT,
        GlyphStyle::default(),
        ColorSource::default(),
    )
    .unwrap_err();
    assert!(matches!(err, VolumError::EmptyField(_)));
}

#[test]
fn zero_grid_below_level_has_no_surface() {
    init_logging();
    let shape = GridShape::new(3, 3, 3).unwrap();
    let field =
        ScalarFieldDescriptor::new(shape, Bounds::UNIT, vec![0.0; 27], vec![1.0], ColorSource::default())
            .unwrap();
    let FieldOutput::Isosurfaces(output) = visualize(&field.into(), &VisualizationOptions::default()).unwrap()
    else {
        panic!("expected isosurfaces");
    };
    assert_eq!(output.surfaces.len(), 1);
    assert!(output.surfaces[0].mesh.is_empty());
}

#[test]
fn uniform_magnitudes_color_to_zero_on_both_paths() {
    init_logging();
    let vectors: Vec<Vec3> = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z]
        .into_iter()
        .map(|v| v * 3.0)
        .collect();
    let positions: Vec<Vec3> = (0..vectors.len()).map(|i| Vec3::new(i as f32 / 10.0, 0.0, 0.0)).collect();
    let field = VectorFieldDescriptor::new(
        positions,
        vectors,
        Bounds::UNIT,
        GlyphStyle::default(),
        ColorSource::default(),
    )
    .unwrap();

    for threshold in [0, usize::MAX] {
        let policy = DispatchPolicy::new(threshold);
        match policy.visualize_vector(&field) {
            GlyphOutput::Cpu(glyphs) => {
                assert!(glyphs.color_scalars.iter().all(|&c| c == 0.0));
                assert!(glyphs.transforms.iter().all(Mat4::is_finite));
            }
            GlyphOutput::Gpu(glyphs) => {
                assert_eq!(glyphs.uniforms.max_magnitude, glyphs.uniforms.min_magnitude);
                for i in 0..glyphs.len() {
                    let resolved = glyphs.resolve(i).unwrap();
                    assert_eq!(resolved.color_scalar, 0.0);
                    assert_eq!(resolved.magnitude, 0.0);
                    assert!(resolved.transform.is_finite());
                }
            }
        }
    }
}

#[test]
fn forced_paths_match_per_channel() {
    init_logging();
    let n = 200;
    let positions: Vec<Vec3> = (0..n)
        .map(|i| {
            let t = i as f32 / n as f32;
            Vec3::new(t * 4.0 - 2.0, (t * 9.0).sin(), (t * 5.0).cos())
        })
        .collect();
    let vectors: Vec<Vec3> = positions.iter().map(|p| Vec3::new(-p.y, p.x, 0.5 * p.z)).collect();
    let bounds = Bounds::from_points(&positions).unwrap();

    for channel in ["magnitude", "x", "height", "z", "w"] {
        let style = GlyphStyle {
            channel: ColorChannel::resolve(channel),
            ..GlyphStyle::default()
        };
        let field = VectorFieldDescriptor::new(
            positions.clone(),
            vectors.clone(),
            bounds,
            style,
            ColorSource::ramp_named("plasma"),
        )
        .unwrap();

        let GlyphOutput::Cpu(cpu) = DispatchPolicy::new(n).visualize_vector(&field) else {
            panic!("{channel}: expected cpu glyphs at the threshold");
        };
        let GlyphOutput::Gpu(gpu) = DispatchPolicy::new(n - 1).visualize_vector(&field) else {
            panic!("{channel}: expected gpu glyphs above the threshold");
        };

        for i in 0..n {
            let resolved = gpu.resolve(i).unwrap();
            assert!((resolved.magnitude - cpu.magnitudes[i]).abs() < 1e-5, "{channel} #{i}");
            assert!((resolved.color_scalar - cpu.color_scalars[i]).abs() < 1e-5, "{channel} #{i}");
            assert!(resolved.transform.abs_diff_eq(cpu.transforms[i], 1e-4), "{channel} #{i}");
        }
    }
}

#[test]
fn sphere_isosurface_in_world_space() {
    init_logging();
    let n = 16_u32;
    let shape = GridShape::new(n, n, n).unwrap();
    let center = (n - 1) as f32 / 2.0;
    let mut values = Vec::with_capacity(shape.node_count());
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let p = Vec3::new(x as f32, y as f32, z as f32) - Vec3::splat(center);
                values.push(p.length());
            }
        }
    }
    let bounds = Bounds::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let field = ScalarFieldDescriptor::new(shape, bounds, values, vec![3.0, 5.0], ColorSource::default()).unwrap();

    let FieldOutput::Isosurfaces(output) = visualize(&field.into(), &VisualizationOptions::default()).unwrap()
    else {
        panic!("expected isosurfaces");
    };
    assert_eq!(output.non_empty().count(), 2);

    // grid spacing is 2 / 15 world units; level r maps to radius r * 2 / 15
    for surface in &output.surfaces {
        let expected = surface.level * 2.0 / 15.0;
        for p in &surface.mesh.positions {
            assert!((p.length() - expected).abs() < 0.05, "level {}: {p}", surface.level);
        }
        assert_eq!(surface.grid_to_world.to_matrix(), GridTransform::new(&bounds, &shape).to_matrix());
    }
    assert!(output.level_color(3.0).is_some());
}

#[test]
fn batch_keeps_input_order() {
    init_logging();
    let shape = GridShape::new(2, 2, 2).unwrap();
    let scalar =
        ScalarFieldDescriptor::new(shape, Bounds::UNIT, vec![0.0; 8], vec![0.5], ColorSource::default()).unwrap();
    let fields = vec![
        FieldDescriptor::from(two_vectors(GlyphStyle::default()).unwrap()),
        FieldDescriptor::from(scalar),
        FieldDescriptor::from(two_vectors(GlyphStyle::default()).unwrap()),
    ];

    let options = VisualizationOptions::default().with_gpu_instance_threshold(1);
    let outputs = visualize_all(&fields, &options);
    assert_eq!(outputs.len(), 3);
    assert!(matches!(outputs[0], Ok(FieldOutput::Glyphs(GlyphOutput::Gpu(_)))));
    assert!(matches!(outputs[1], Ok(FieldOutput::Isosurfaces(_))));
    assert!(matches!(outputs[2], Ok(FieldOutput::Glyphs(GlyphOutput::Gpu(_)))));
}

#[test]
fn gpu_glyphs_have_a_matching_shader() {
    init_logging();
    let field = two_vectors(GlyphStyle::default()).unwrap();
    let GlyphOutput::Gpu(glyphs) = DispatchPolicy::new(0).visualize_vector(&field) else {
        panic!("expected gpu glyphs");
    };
    let ramp = glyphs.color.ramp().unwrap();
    let source = render::glyph_shader_source(ramp);
    assert!(source.contains("// viridis colormap"));
    let (positions, _) = render::expand_mesh(&GlyphGeometry::default().mesh().unwrap());
    assert_eq!(positions.len(), 18);
}

fn vec3_strategy() -> impl Strategy<Value = Vec3> {
    (-10.0_f32..10.0, -10.0_f32..10.0, -10.0_f32..10.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    #[test]
    fn prop_paths_agree(samples in proptest::collection::vec((vec3_strategy(), vec3_strategy()), 1..48)) {
        let (positions, vectors): (Vec<Vec3>, Vec<Vec3>) = samples.into_iter().unzip();
        let bounds = Bounds::from_points(&positions).unwrap();
        let field = VectorFieldDescriptor::new(
            positions,
            vectors,
            bounds,
            GlyphStyle::default(),
            ColorSource::default(),
        )
        .unwrap();

        let GlyphOutput::Cpu(cpu) = DispatchPolicy::new(usize::MAX).visualize_vector(&field) else {
            panic!("expected cpu glyphs");
        };
        let GlyphOutput::Gpu(gpu) = DispatchPolicy::new(0).visualize_vector(&field) else {
            panic!("expected gpu glyphs");
        };
        for i in 0..cpu.len() {
            let resolved = gpu.resolve(i).unwrap();
            prop_assert!((0.0..=1.0).contains(&cpu.magnitudes[i]));
            prop_assert!((resolved.magnitude - cpu.magnitudes[i]).abs() < 1e-5);
            prop_assert!(resolved.transform.abs_diff_eq(cpu.transforms[i], 1e-3));
        }
    }
}

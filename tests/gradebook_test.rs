// ==========================================
// 成绩册测试
// ==========================================
// 职责: 验证权重定义、成绩录入、总评计算与快照解耦、
//       教学班统计及任课教师准入
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod gradebook_test {
    use campus_enrollment::api::ApiError;
    use std::collections::BTreeMap;

    use crate::test_helpers::{
        admin, insert_section, instructor_actor, make_section, seed_basic, setup_test_env, TestEnv,
    };

    fn weights(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(name, weight)| (name.to_string(), *weight))
            .collect()
    }

    /// 布置一个在册学生 S001 的教学班 SEC-100
    fn setup_section_with_student(env: &TestEnv) {
        seed_basic(env);
        insert_section(env, &make_section("SEC-100", "CS101", 5));
        env.enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
    }

    // ==========================================
    // 场景: Quiz 20 / Midterm 30 / Final 50
    // ==========================================

    #[test]
    fn test_weighted_final_grade() {
        let env = setup_test_env();
        setup_section_with_student(&env);
        let instructor = instructor_actor("prof.zhang");

        env.gradebook_api
            .define_assessments(
                Some(&instructor),
                "SEC-100",
                weights(&[("Quiz", 20.0), ("Midterm", 30.0), ("Final", 50.0)]),
            )
            .unwrap();

        for (component, score) in [("Quiz", 80.0), ("Midterm", 70.0), ("Final", 90.0)] {
            env.gradebook_api
                .record_score(Some(&instructor), "SEC-100", "S001", component, score)
                .unwrap();
        }

        // 80*0.2 + 70*0.3 + 90*0.5 = 82
        let final_grade = env
            .gradebook_api
            .compute_final(Some(&instructor), "SEC-100", "S001")
            .unwrap();
        assert!((final_grade - 82.0).abs() < 1e-9);

        // 写回记录
        let record = env
            .enrollment_repo
            .find_record("SEC-100", "S001")
            .unwrap()
            .unwrap();
        assert!((record.final_grade - 82.0).abs() < 1e-9);
        assert_eq!(record.weighting.get("Final"), Some(&50.0));
    }

    #[test]
    fn test_compute_final_idempotent() {
        let env = setup_test_env();
        setup_section_with_student(&env);
        let instructor = instructor_actor("prof.zhang");

        env.gradebook_api
            .define_assessments(Some(&instructor), "SEC-100", weights(&[("Final", 100.0)]))
            .unwrap();
        env.gradebook_api
            .record_score(Some(&instructor), "SEC-100", "S001", "Final", 77.5)
            .unwrap();

        let first = env
            .gradebook_api
            .compute_final(Some(&instructor), "SEC-100", "S001")
            .unwrap();
        let second = env
            .gradebook_api
            .compute_final(Some(&instructor), "SEC-100", "S001")
            .unwrap();
        assert_eq!(first, second);
    }

    // ==========================================
    // 权重快照与在用方案解耦
    // ==========================================

    #[test]
    fn test_weighting_snapshot_decoupled_from_live_scheme() {
        let env = setup_test_env();
        setup_section_with_student(&env);
        let instructor = instructor_actor("prof.zhang");

        env.gradebook_api
            .define_assessments(
                Some(&instructor),
                "SEC-100",
                weights(&[("Quiz", 50.0), ("Final", 50.0)]),
            )
            .unwrap();
        env.gradebook_api
            .record_score(Some(&instructor), "SEC-100", "S001", "Quiz", 60.0)
            .unwrap();
        env.gradebook_api
            .record_score(Some(&instructor), "SEC-100", "S001", "Final", 80.0)
            .unwrap();

        let grade_before = env
            .gradebook_api
            .compute_final(Some(&instructor), "SEC-100", "S001")
            .unwrap();
        assert!((grade_before - 70.0).abs() < 1e-9);

        // 修改在用方案: 已算出的总评与快照不受影响
        env.gradebook_api
            .define_assessments(Some(&instructor), "SEC-100", weights(&[("Final", 100.0)]))
            .unwrap();

        let record = env
            .enrollment_repo
            .find_record("SEC-100", "S001")
            .unwrap()
            .unwrap();
        assert!((record.final_grade - 70.0).abs() < 1e-9);
        assert_eq!(record.weighting.get("Quiz"), Some(&50.0));

        // 重新计算后才采用新方案
        let grade_after = env
            .gradebook_api
            .compute_final(Some(&instructor), "SEC-100", "S001")
            .unwrap();
        assert!((grade_after - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_define_assessments_full_replace() {
        let env = setup_test_env();
        setup_section_with_student(&env);
        let instructor = instructor_actor("prof.zhang");

        env.gradebook_api
            .define_assessments(
                Some(&instructor),
                "SEC-100",
                weights(&[("Quiz", 40.0), ("Final", 60.0)]),
            )
            .unwrap();
        // 全量替换: Quiz 不再保留
        env.gradebook_api
            .define_assessments(Some(&instructor), "SEC-100", weights(&[("Final", 100.0)]))
            .unwrap();

        let section = env.section_repo.find_by_id("SEC-100").unwrap().unwrap();
        assert_eq!(section.assessment_weights.len(), 1);
        assert!(!section.assessment_weights.contains_key("Quiz"));
    }

    #[test]
    fn test_missing_score_counts_as_zero() {
        let env = setup_test_env();
        setup_section_with_student(&env);
        let instructor = instructor_actor("prof.zhang");

        env.gradebook_api
            .define_assessments(
                Some(&instructor),
                "SEC-100",
                weights(&[("Quiz", 20.0), ("Final", 80.0)]),
            )
            .unwrap();
        env.gradebook_api
            .record_score(Some(&instructor), "SEC-100", "S001", "Quiz", 100.0)
            .unwrap();

        // Final 未录入按 0 计
        let final_grade = env
            .gradebook_api
            .compute_final(Some(&instructor), "SEC-100", "S001")
            .unwrap();
        assert!((final_grade - 20.0).abs() < 1e-9);
    }

    // ==========================================
    // 教学班统计
    // ==========================================

    #[test]
    fn test_stats_only_cover_enrolled_students() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 2));
        let instructor = instructor_actor("prof.zhang");

        // S001/S002 在册, S003 候补, S004 退课
        for id in ["S001", "S002", "S003"] {
            env.enrollment_api
                .register_section(Some(&admin()), id, "SEC-100")
                .unwrap();
        }
        env.enrollment_api
            .register_section(Some(&admin()), "S004", "SEC-100")
            .unwrap();
        env.enrollment_api
            .drop_section(Some(&admin()), "S004", "SEC-100")
            .unwrap();

        env.gradebook_api
            .define_assessments(Some(&instructor), "SEC-100", weights(&[("Final", 100.0)]))
            .unwrap();
        env.gradebook_api
            .record_score(Some(&instructor), "SEC-100", "S001", "Final", 90.0)
            .unwrap();
        env.gradebook_api
            .record_score(Some(&instructor), "SEC-100", "S002", "Final", 60.0)
            .unwrap();
        env.gradebook_api
            .compute_final(Some(&instructor), "SEC-100", "S001")
            .unwrap();
        env.gradebook_api
            .compute_final(Some(&instructor), "SEC-100", "S002")
            .unwrap();

        let stats = env
            .gradebook_api
            .stats_for_section(Some(&instructor), "SEC-100")
            .unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.average - 75.0).abs() < 1e-9);
        assert_eq!(stats.max, Some(90.0));
        assert_eq!(stats.min, Some(60.0));
    }

    // ==========================================
    // 任课教师准入
    // ==========================================

    #[test]
    fn test_unassigned_instructor_forbidden() {
        let env = setup_test_env();
        setup_section_with_student(&env);

        // 其他教师账号
        let mut outsider = campus_enrollment::domain::Faculty::new("F002", "强", "刘");
        outsider.username = Some("prof.liu".to_string());
        env.faculty_repo.upsert(&outsider).unwrap();

        let err = env
            .gradebook_api
            .define_assessments(
                Some(&instructor_actor("prof.liu")),
                "SEC-100",
                weights(&[("Final", 100.0)]),
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // 无教师档案的账号同样拒绝
        let err = env
            .gradebook_api
            .stats_for_section(Some(&instructor_actor("ghost")), "SEC-100")
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // 未认证
        let err = env
            .gradebook_api
            .compute_final(None, "SEC-100", "S001")
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[test]
    fn test_record_score_requires_enrollment_record() {
        let env = setup_test_env();
        setup_section_with_student(&env);
        let instructor = instructor_actor("prof.zhang");

        let err = env
            .gradebook_api
            .record_score(Some(&instructor), "SEC-100", "S002", "Final", 88.0)
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_record_score_allowed_for_dropped_student() {
        let env = setup_test_env();
        setup_section_with_student(&env);
        let instructor = instructor_actor("prof.zhang");

        env.enrollment_api
            .drop_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();

        // 退课学生的成绩历史仍可补录
        env.gradebook_api
            .record_score(Some(&instructor), "SEC-100", "S001", "Quiz", 66.0)
            .unwrap();
        let record = env
            .enrollment_repo
            .find_record("SEC-100", "S001")
            .unwrap()
            .unwrap();
        assert_eq!(record.component_scores.get("Quiz"), Some(&66.0));
    }
}

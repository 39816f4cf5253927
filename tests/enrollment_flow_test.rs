// ==========================================
// 选课流程测试
// ==========================================
// 职责: 验证容量判定、候补队列、退课晋升的核心链路
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod enrollment_flow_test {
    use campus_enrollment::api::ApiError;
    use campus_enrollment::domain::types::EnrollmentStatus;

    use crate::test_helpers::{admin, insert_section, make_section, seed_basic, setup_test_env};

    // ==========================================
    // 场景: 容量 1 的教学班, 报名/候补/退课晋升
    // ==========================================

    #[test]
    fn test_register_with_seat_enrolls() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 1));

        let record = env
            .enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        assert_eq!(record.status, EnrollmentStatus::Enrolled);

        let section = env.section_repo.find_by_id("SEC-100").unwrap().unwrap();
        assert_eq!(section.available_seats(), 0);
        assert!(section.is_full());
        assert_eq!(section.enrolled, vec!["S001".to_string()]);
    }

    #[test]
    fn test_register_full_section_waitlists() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 1));

        env.enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        let record = env
            .enrollment_api
            .register_section(Some(&admin()), "S002", "SEC-100")
            .unwrap();

        assert_eq!(record.status, EnrollmentStatus::Waitlisted);
        assert_eq!(
            env.enrollment_api
                .waitlist_position("SEC-100", "S002")
                .unwrap(),
            Some(1)
        );

        // 容量不变式: 满员后在册人数不超过容量
        let section = env.section_repo.find_by_id("SEC-100").unwrap().unwrap();
        assert_eq!(section.enrolled.len(), 1);
    }

    #[test]
    fn test_drop_enrolled_promotes_waitlist_head() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 1));

        env.enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        env.enrollment_api
            .register_section(Some(&admin()), "S002", "SEC-100")
            .unwrap();

        env.enrollment_api
            .drop_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();

        let dropped = env
            .enrollment_repo
            .find_record("SEC-100", "S001")
            .unwrap()
            .unwrap();
        assert_eq!(dropped.status, EnrollmentStatus::Dropped);

        // S2 自动晋升
        let promoted = env
            .enrollment_repo
            .find_record("SEC-100", "S002")
            .unwrap()
            .unwrap();
        assert_eq!(promoted.status, EnrollmentStatus::Enrolled);

        let section = env.section_repo.find_by_id("SEC-100").unwrap().unwrap();
        assert_eq!(section.enrolled, vec!["S002".to_string()]);
        assert!(section.waitlist.is_empty());
    }

    // ==========================================
    // 候补队列 FIFO 公平性
    // ==========================================

    #[test]
    fn test_fifo_fairness_two_seats_free_up() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 2));

        // 两个名额占满, A/B/C 依次候补
        env.enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        env.enrollment_api
            .register_section(Some(&admin()), "S002", "SEC-100")
            .unwrap();
        for id in ["S003", "S004", "S005"] {
            let record = env
                .enrollment_api
                .register_section(Some(&admin()), id, "SEC-100")
                .unwrap();
            assert_eq!(record.status, EnrollmentStatus::Waitlisted);
        }

        // 两个名额释放: A(S003)、B(S004) 先于 C(S005) 晋升
        env.enrollment_api
            .drop_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        env.enrollment_api
            .drop_section(Some(&admin()), "S002", "SEC-100")
            .unwrap();

        for (id, expected) in [
            ("S003", EnrollmentStatus::Enrolled),
            ("S004", EnrollmentStatus::Enrolled),
            ("S005", EnrollmentStatus::Waitlisted),
        ] {
            let record = env.enrollment_repo.find_record("SEC-100", id).unwrap().unwrap();
            assert_eq!(record.status, expected, "student {}", id);
        }

        let section = env.section_repo.find_by_id("SEC-100").unwrap().unwrap();
        assert_eq!(section.enrolled, vec!["S003".to_string(), "S004".to_string()]);
        assert_eq!(section.waitlist_position("S005"), Some(1));
    }

    #[test]
    fn test_drop_waitlisted_does_not_promote() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 1));

        env.enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        env.enrollment_api
            .register_section(Some(&admin()), "S002", "SEC-100")
            .unwrap();
        env.enrollment_api
            .register_section(Some(&admin()), "S003", "SEC-100")
            .unwrap();

        // 候补学生退课: 不触发晋升, 其余候补位次前移
        env.enrollment_api
            .drop_section(Some(&admin()), "S002", "SEC-100")
            .unwrap();

        let section = env.section_repo.find_by_id("SEC-100").unwrap().unwrap();
        assert_eq!(section.enrolled, vec!["S001".to_string()]);
        assert_eq!(section.waitlist_position("S003"), Some(1));

        let enrolled = env
            .enrollment_repo
            .find_record("SEC-100", "S001")
            .unwrap()
            .unwrap();
        assert_eq!(enrolled.status, EnrollmentStatus::Enrolled);
        let still_waiting = env
            .enrollment_repo
            .find_record("SEC-100", "S003")
            .unwrap()
            .unwrap();
        assert_eq!(still_waiting.status, EnrollmentStatus::Waitlisted);
    }

    // ==========================================
    // 重复报名与重新报名
    // ==========================================

    #[test]
    fn test_duplicate_registration_rejected() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 5));

        env.enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        let err = env
            .enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyRegistered { .. }));

        // 名单未被污染
        let section = env.section_repo.find_by_id("SEC-100").unwrap().unwrap();
        assert_eq!(section.enrolled.len(), 1);
        assert!(section.waitlist.is_empty());
    }

    #[test]
    fn test_reregister_after_drop_reuses_record() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 5));

        env.enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();

        // 留下一条成绩历史
        let mut record = env
            .enrollment_repo
            .find_record("SEC-100", "S001")
            .unwrap()
            .unwrap();
        record.put_score("Quiz", 95.0);
        env.enrollment_repo.save(&record).unwrap();

        env.enrollment_api
            .drop_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();

        // 重新报名复用同一条记录, 历史成绩保留
        let record = env
            .enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        assert_eq!(record.status, EnrollmentStatus::Enrolled);
        assert_eq!(record.component_scores.get("Quiz"), Some(&95.0));

        let records = env.enrollment_repo.find_by_section("SEC-100").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_drop_without_registration_fails() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 1));

        let err = env
            .enrollment_api
            .drop_section(Some(&admin()), "S001", "SEC-100")
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    // ==========================================
    // 容量不变式: 任意报名/退课序列
    // ==========================================

    #[test]
    fn test_capacity_invariant_over_mixed_sequence() {
        let env = setup_test_env();
        seed_basic(&env);
        insert_section(&env, &make_section("SEC-100", "CS101", 2));

        let students = ["S001", "S002", "S003", "S004", "S005"];
        for id in students {
            env.enrollment_api
                .register_section(Some(&admin()), id, "SEC-100")
                .unwrap();
            assert_invariants(&env, 2);
        }
        for id in ["S001", "S003"] {
            env.enrollment_api
                .drop_section(Some(&admin()), id, "SEC-100")
                .unwrap();
            assert_invariants(&env, 2);
        }
        env.enrollment_api
            .register_section(Some(&admin()), "S001", "SEC-100")
            .unwrap();
        assert_invariants(&env, 2);
    }

    /// 每个观察点校验: |enrolled| <= capacity 且无双重占位
    fn assert_invariants(env: &crate::test_helpers::TestEnv, capacity: usize) {
        let section = env.section_repo.find_by_id("SEC-100").unwrap().unwrap();
        assert!(section.enrolled.len() <= capacity);
        for student_id in &section.enrolled {
            assert!(
                !section.waitlist.iter().any(|s| s == student_id),
                "{} 同时出现在在册与候补名单",
                student_id
            );
        }
    }
}

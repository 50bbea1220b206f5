//! End-to-end runs of the synthesis pipeline against the kitchen fixture.

mod pipeline {
    use std::sync::Arc;

    use dialog_synth::instruction::{ClearedInstruction, ClearedParameter};
    use dialog_synth::report::ArgumentValue;
    use dialog_synth::{
        Command, CommandBuilder, Config, FunctionCallFinder, FunctionNameCandidate,
        FunctionParameterCandidate, Individual, Instruction, InstructionKind, MethodSynthesizer,
        Ontology, Parameter, SrlExtractor, Token, Utterance, UtteranceInput,
    };
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    const KITCHEN: &str = include_str!("fixtures/kitchen.json");
    const MAKE_COFFEE: &str = include_str!("fixtures/make_coffee.json");

    fn kitchen() -> Result<Ontology, dialog_synth::SynthError> {
        Ontology::from_json(KITCHEN)
    }

    fn verb(position: usize, value: &str) -> Token {
        Token::new(position, value, "VB")
            .lemma(value)
            .chunk("VP", "B-VP")
    }

    fn word(position: usize, value: &str, pos: &str) -> Token {
        Token::new(position, value, pos).lemma(value).chunk("NP", "I-NP")
    }

    /// "open the microwave door", every token labelled `label`.
    fn open_microwave_door(label: Option<&str>) -> UtteranceInput {
        let tokens = vec![
            verb(0, "open"),
            word(1, "the", "DT"),
            word(2, "microwave", "NN"),
            word(3, "door", "NN"),
        ];
        let tokens = match label {
            Some(label) => tokens.into_iter().map(|token| token.label(label)).collect(),
            None => tokens,
        };
        UtteranceInput::chained(tokens)
            .arc(0, 0, "V")
            .arc(0, 1, "A1")
            .arc(0, 2, "A1")
            .arc(0, 3, "A1")
    }

    #[test_log::test]
    fn execution_command_for_plain_instruction() -> TestResult {
        let ontology = kitchen()?;
        let synthesizer = MethodSynthesizer::new(&ontology, Config::default())?;
        let synthesis = synthesizer.synthesize(open_microwave_door(None))?;

        assert!(!synthesis.command.is_teaching());
        let descriptions = synthesis.command.descriptions();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].name, "open");
        assert_eq!(descriptions[0].parameters.len(), 1);
        assert_eq!(descriptions[0].parameters[0].name, "the microwave door");

        let candidate = &synthesis.candidate;
        assert!(candidate.signature.is_none());
        assert_eq!(candidate.script.len(), 1);

        let report = synthesis.report(&ontology);
        let best = &report.script[0].calls[0];
        assert_eq!(best.method, "open");
        assert_eq!(
            best.arguments[0].value,
            ArgumentValue::Individual("MicrowaveDoor".into())
        );
        Ok(())
    }

    #[test_log::test]
    fn teaching_command_yields_signature() -> TestResult {
        let ontology = kitchen()?;
        let synthesizer = MethodSynthesizer::new(&ontology, Config::default())?;
        let input: UtteranceInput = serde_json::from_str(MAKE_COFFEE)?;
        let synthesis = synthesizer.synthesize(input)?;

        let command = &synthesis.command;
        assert!(command.is_teaching());
        assert_eq!(command.declarations().len(), 1);
        assert_eq!(command.descriptions().len(), 1);
        assert_eq!(command.declarations()[0].name, "make");
        assert_eq!(command.descriptions()[0].name, "press");

        let signature = synthesis.candidate.signature.as_ref().ok_or("no signature")?;
        assert_eq!(signature.name, "make");

        let report = synthesis.report(&ontology);
        assert_eq!((report.mapped, report.attempted), (1, 1));
        let best = &report.script[0].calls[0];
        assert_eq!(best.method, "press");
        assert_eq!(best.arguments[0].value, ArgumentValue::Individual("Button".into()));
        assert_eq!(best.arguments[0].positions, vec![7, 8, 9]);
        Ok(())
    }

    #[test_log::test]
    fn teaching_an_existing_method_marks_the_conflict() -> TestResult {
        let label = |token: Token, label: &str| token.label(label);
        let tokens = vec![
            label(verb(0, "open"), "DECL"),
            label(word(1, "the", "DT"), "DECL"),
            label(word(2, "fridge", "NN"), "DECL"),
            label(verb(3, "press").instruction(1), "DESC"),
            label(word(4, "the", "DT").instruction(1), "DESC"),
            label(word(5, "button", "NN").instruction(1), "DESC"),
        ];
        let input = UtteranceInput::chained(tokens)
            .arc(0, 0, "V")
            .arc(0, 1, "A1")
            .arc(0, 2, "A1")
            .arc(3, 3, "V")
            .arc(3, 4, "A1")
            .arc(3, 5, "A1")
            .teaching(true, 0.9);

        let ontology = kitchen()?;
        let synthesizer = MethodSynthesizer::new(&ontology, Config::default())?;
        let synthesis = synthesizer.synthesize(input)?;

        let signature = synthesis.candidate.signature.as_ref().ok_or("no signature")?;
        assert_eq!(signature.name, "NAMECONFLICT_openFridge");
        assert_eq!(signature.parameters.len(), 1);

        let report = synthesis.report(&ontology);
        assert_eq!(report.script.len(), 1);
        assert_eq!(report.script[0].calls[0].method, "press");
        Ok(())
    }

    #[test_log::test]
    fn teaching_without_declarations_falls_back() -> TestResult {
        let utterance = Utterance::new(open_microwave_door(Some("ELSE")))?;
        let builder = CommandBuilder::new(&utterance, SrlExtractor::default());
        assert_eq!(
            builder.build_teaching_command()?,
            builder.build_execution_command()
        );

        let ontology = kitchen()?;
        let synthesizer = MethodSynthesizer::new(&ontology, Config::default())?;
        let synthesis = synthesizer.synthesize(open_microwave_door(Some("ELSE")).teaching(true, 0.9))?;
        assert!(!synthesis.command.is_teaching());
        assert!(synthesis.candidate.signature.is_none());
        Ok(())
    }

    #[test_log::test]
    fn primitive_method_with_two_groups() -> TestResult {
        let ontology = kitchen()?;
        let object = |name: &str| {
            ontology
                .objects()
                .find(|(_, object)| object.name == name)
                .map(|(id, _)| Individual::Object(id))
                .ok_or("unknown object")
        };
        let parameter = |position: usize, value: &str| {
            let token = word(position, value, "NN");
            Arc::new(Parameter::new("A1", vec![token.clone()]).with_cleared(ClearedParameter {
                tokens: vec![token],
                name: value.into(),
                synonyms: vec![],
            }))
        };
        let cup = parameter(2, "cup");
        let fridge = parameter(4, "fridge");

        let instruction = Instruction::new(InstructionKind::Description, vec![verb(0, "say")], vec![])
            .with_cleared(ClearedInstruction {
                name_tokens: vec![verb(0, "say")],
                name: "say".into(),
                surface_name: "say".into(),
                synonyms: vec![],
                parameters: vec![cup.clone(), fridge.clone()],
            });
        let name = FunctionNameCandidate {
            score: 1.0,
            method: ontology.method_by_name("say").ok_or("no say method")?,
            instruction: Arc::new(instruction),
        };
        let groups = vec![
            vec![FunctionParameterCandidate::matched(0.9, object("Cup")?, cup)],
            vec![FunctionParameterCandidate::matched(0.9, object("Fridge")?, fridge)],
        ];

        let calls = FunctionCallFinder::new(&ontology).find(&[name], &groups);
        assert_eq!(calls.len(), 3);
        Ok(())
    }

    #[test_log::test]
    fn top_n_limits_every_script_entry() -> TestResult {
        let ontology = kitchen()?;
        let synthesizer = MethodSynthesizer::new(&ontology, Config::default().with_top_n(1))?;
        let synthesis = synthesizer.synthesize(open_microwave_door(None))?;
        assert!(synthesis.candidate.script.iter().all(|entry| entry.calls.len() <= 1));
        Ok(())
    }

    #[test_log::test]
    fn config_loads_from_json() -> TestResult {
        let config = Config::from_json(r#"{ "top_n": 5, "parameter_pos": ["NN", "NNS"] }"#)?;
        assert_eq!(config.top_n, 5);
        assert!(config.parameter_pos.contains("NNS"));
        assert!(config.use_context);
        assert!(Config::from_json(r#"{ "top_n": 0 }"#).is_err());
        Ok(())
    }

    #[test_log::test]
    fn broken_chain_is_rejected() -> TestResult {
        let mut input = open_microwave_door(None);
        input.next.push((0, 2));
        let ontology = kitchen()?;
        let synthesizer = MethodSynthesizer::new(&ontology, Config::default())?;
        let error = synthesizer.synthesize(input).err().ok_or("expected an error")?;
        assert!(error.is_missing_input());
        Ok(())
    }

    #[test_log::test]
    fn every_instruction_is_bucketed_once() -> TestResult {
        let input: UtteranceInput = serde_json::from_str(MAKE_COFFEE)?;
        let utterance = Utterance::new(input)?;
        let builder = CommandBuilder::new(&utterance, SrlExtractor::default());
        let command = builder.build(true)?;
        let Command::Teaching { declarations, descriptions, elses } = &command else {
            return Err("expected a teaching command".into());
        };
        assert_eq!(
            declarations.len() + descriptions.len() + elses.len(),
            builder.chunks().len()
        );
        Ok(())
    }
}
